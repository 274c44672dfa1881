use rand::rngs::OsRng;
use rand::Rng;

pub const OTP_DIGITS: usize = 4;

/// Fresh 4-digit pickup code, sampled uniformly over `0000..=9999` from the
/// operating-system CSPRNG. Leading zeros are preserved.
pub fn generate_otp() -> String {
    let code: u16 = OsRng.gen_range(0..10_000);
    format!("{:0width$}", code, width = OTP_DIGITS)
}
