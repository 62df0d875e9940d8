// Hex encoding for ciphertexts sent to a remote oracle.

fn hex_item_to_byte(item: &[char]) -> Result<u8, String> {
    let digits: String = item.iter().collect();
    // from_str_radix would also take a leading sign.
    if !item.iter().all(char::is_ascii_hexdigit) {
        return Err(format!("invalid hex digits '{digits}'"));
    }
    u8::from_str_radix(&digits, 16).map_err(|e| format!("{e}"))
}

pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err(format!("odd number of hex digits: {}", hex.len()));
    }
    let chars: Vec<char> = hex.chars().collect();
    chars.chunks(2).map(hex_item_to_byte).collect()
}

pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .fold(String::with_capacity(bytes.len() * 2), |s, hb| s + &hb)
}
