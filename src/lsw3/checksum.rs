pub struct Checksum;
impl Checksum {
    /// CRC-16/MODBUS: seed 0xFFFF, reflected polynomial 0xA001, no final xor.
    pub fn crc16(data: &[u8]) -> u16 {
        let mut crc: u16 = 0xFFFF;
        for byte in data {
            crc ^= u16::from(*byte);
            for _ in 0..8 {
                if crc & 0x0001 != 0 {
                    crc = (crc >> 1) ^ 0xA001;
                } else {
                    crc >>= 1;
                }
            }
        }
        crc
    }

    /// Sum of all bytes, modulo 256.
    pub fn frame(data: &[u8]) -> u8 {
        data.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
    }
}
