const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
    0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

/// FIT CRC-16, fed one byte at a time (low nibble first).
pub fn update(crc: u16, byte: u8) -> u16 {
    let mut tmp = CRC_TABLE[(crc & 0xF) as usize];
    let mut crc = (crc >> 4) & 0x0FFF;
    crc = crc ^ tmp ^ CRC_TABLE[(byte & 0xF) as usize];

    tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc ^ tmp ^ CRC_TABLE[((byte >> 4) & 0xF) as usize]
}

pub fn checksum(data: &[u8]) -> u16 {
    data.iter().fold(0, |crc, &b| update(crc, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_check_value() {
        // CRC-16/ARC check value
        assert_eq!(checksum(b"123456789"), 0xBB3D);
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_checksum_including_crc_is_zero() {
        let mut data = b".FIT header bytes".to_vec();
        let crc = checksum(&data);
        data.extend_from_slice(&crc.to_le_bytes());
        assert_eq!(checksum(&data), 0);
    }
}
