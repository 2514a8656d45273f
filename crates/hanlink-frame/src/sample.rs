//! Canned frame used by the simulator, the `sample` command and tests.

/// A complete 705-byte frame from the default profile with a valid checksum.
///
/// Known values: active import total 5996.149 kWh, L1 voltage 236.3 V,
/// L1 current 7.0 A, meter time 2020-10-17 09:30:15 summer time.
pub const SAMPLE_FRAME: &[u8] = b"\
    /ADN9 6534\r\n\
    \r\n\
    0-0:1.0.0(201017093015S)\r\n\
    1-0:1.8.0(00005996.149*kWh)\r\n\
    1-0:2.8.0(00000000.000*kWh)\r\n\
    1-0:3.8.0(00000021.988*kVArh)\r\n\
    1-0:4.8.0(00001020.971*kVArh)\r\n\
    1-0:1.7.0(0001.727*kW)\r\n\
    1-0:2.7.0(0000.000*kW)\r\n\
    1-0:3.7.0(0000.000*kVAr)\r\n\
    1-0:4.7.0(0000.309*kVAr)\r\n\
    1-0:21.7.0(0001.023*kW)\r\n\
    1-0:41.7.0(0000.350*kW)\r\n\
    1-0:61.7.0(0000.353*kW)\r\n\
    1-0:22.7.0(0000.000*kW)\r\n\
    1-0:42.7.0(0000.000*kW)\r\n\
    1-0:62.7.0(0000.000*kW)\r\n\
    1-0:23.7.0(0000.000*kVAr)\r\n\
    1-0:43.7.0(0000.000*kVAr)\r\n\
    1-0:63.7.0(0000.000*kVAr)\r\n\
    1-0:24.7.0(0000.009*kVAr)\r\n\
    1-0:44.7.0(0000.161*kVAr)\r\n\
    1-0:64.7.0(0000.138*kVAr)\r\n\
    1-0:32.7.0(236.3*V)\r\n\
    1-0:52.7.0(240.1*V)\r\n\
    1-0:72.7.0(241.3*V)\r\n\
    1-0:31.7.0(007.0*A)\r\n\
    1-0:51.7.0(001.6*A)\r\n\
    1-0:71.7.0(001.7*A)\r\n\
    !853C\r\n";
