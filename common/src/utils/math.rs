use rand::Rng;

use crate::constants::{VERIFY_CODE_MAX, VERIFY_CODE_MIN};

/// Four digit numeric code, uniformly drawn from `VERIFY_CODE_MIN..=VERIFY_CODE_MAX`.
pub fn gen_random_verify_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(VERIFY_CODE_MIN..=VERIFY_CODE_MAX).to_string()
}

pub fn gen_random_digit<R: Rng + ?Sized>(rng: &mut R) -> char {
    char::from(b'0' + rng.gen_range(0..10u8))
}

//生成随机值的hex字符串
pub fn generate_random_hex_string(size: usize) -> String {
    let byte_size = (size + 1) / 2;

    let mut rng = rand::thread_rng();
    let mut bytes = vec![0u8; byte_size];
    rng.fill(&mut bytes[..]);

    let hex_string = hex::encode(&bytes);
    hex_string.chars().take(size).collect()
}
