use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::{OsRng, TryCryptoRng, TryRngCore};
use subtle::ConstantTimeEq;

use crate::{
    domain::{
        error::{DomainError, HashError},
        models::credential::{HashParams, HashedPassword},
        services::password_service::PasswordHasher,
    },
    infrastructure::phc_string::PhcString,
};

/// Hash `password` with Argon2id and a fresh salt from the OS random source.
///
/// Each call reserves `params.memory_bytes()` of working memory (about 19 MiB
/// with the defaults) and blocks until the derivation finishes.
pub fn hash_password(password: &str, params: &HashParams) -> Result<HashedPassword, HashError> {
    hash_password_with_rng(password, params, &mut OsRng)
}

/// Same as [`hash_password`] with an explicit random source for the salt.
pub fn hash_password_with_rng<R>(
    password: &str,
    params: &HashParams,
    rng: &mut R,
) -> Result<HashedPassword, HashError>
where
    R: TryCryptoRng + ?Sized,
{
    let mut salt = vec![0u8; params.salt_len];
    TryRngCore::try_fill_bytes(rng, &mut salt)
        .map_err(|e| HashError::RandomSource(e.to_string()))?;

    let key = derive_key(password.as_bytes(), &salt, params)?;

    let encoded = PhcString {
        memory_kib: params.memory_kib,
        time_cost: params.time_cost,
        parallelism: params.parallelism,
        salt,
        key,
    };
    Ok(HashedPassword::new(encoded.to_string()))
}

/// Check `password` against a stored hash using the parameters embedded in it.
///
/// `Ok(false)` is an ordinary mismatch. Any `Err` means the stored hash
/// itself is unusable.
pub fn verify_password(password: &str, hashed_password: &HashedPassword) -> Result<bool, HashError> {
    let stored: PhcString = hashed_password.as_str().parse()?;
    let computed = derive_key(password.as_bytes(), &stored.salt, &stored.params())?;

    Ok(constant_time_eq(&computed, &stored.key))
}

/// Compares every byte of the longer input; a length mismatch is folded into
/// the result rather than returned early.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut equal = (a.len() as u64).ct_eq(&(b.len() as u64));
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        equal &= x.ct_eq(&y);
    }
    equal.into()
}

fn derive_key(password: &[u8], salt: &[u8], params: &HashParams) -> Result<Vec<u8>, HashError> {
    let argon2_params = Params::new(
        params.memory_kib,
        params.time_cost,
        u32::from(params.parallelism),
        Some(params.key_len),
    )
    .map_err(HashError::Derivation)?;

    let mut key = vec![0u8; params.key_len];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params)
        .hash_password_into(password, salt, &mut key)
        .map_err(HashError::Derivation)?;

    Ok(key)
}

#[derive(Clone, Default)]
pub struct Argon2PasswordHasher {
    params: HashParams,
}

impl Argon2PasswordHasher {
    pub fn new(params: HashParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HashParams {
        &self.params
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plain_password: &str) -> Result<HashedPassword, DomainError> {
        Ok(hash_password(plain_password, &self.params)?)
    }

    fn verify(&self, plain_password: &str, hashed_password: &HashedPassword) -> Result<bool, DomainError> {
        Ok(verify_password(plain_password, hashed_password)?)
    }
}

#[cfg(test)]
mod tests {
    use std::{convert::Infallible, fmt};

    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn cheap() -> HashParams {
        HashParams {
            memory_kib: 64,
            time_cost: 1,
            parallelism: 1,
            key_len: 32,
            salt_len: 16,
        }
    }

    #[derive(Debug)]
    struct Exhausted;

    impl fmt::Display for Exhausted {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("entropy pool exhausted")
        }
    }

    /// Random source that always fails
    struct BrokenRng;

    impl TryRngCore for BrokenRng {
        type Error = Exhausted;

        fn try_next_u32(&mut self) -> Result<u32, Exhausted> {
            Err(Exhausted)
        }

        fn try_next_u64(&mut self) -> Result<u64, Exhausted> {
            Err(Exhausted)
        }

        fn try_fill_bytes(&mut self, _dst: &mut [u8]) -> Result<(), Exhausted> {
            Err(Exhausted)
        }
    }

    impl TryCryptoRng for BrokenRng {}

    /// Random source that repeats one byte, for reproducible salts
    struct FixedRng(u8);

    impl TryRngCore for FixedRng {
        type Error = Infallible;

        fn try_next_u32(&mut self) -> Result<u32, Infallible> {
            Ok(u32::from_le_bytes([self.0; 4]))
        }

        fn try_next_u64(&mut self) -> Result<u64, Infallible> {
            Ok(u64::from_le_bytes([self.0; 8]))
        }

        fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<(), Infallible> {
            dst.fill(self.0);
            Ok(())
        }
    }

    impl TryCryptoRng for FixedRng {}

    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    /// Swap a base64 character for one whose most significant bit differs
    fn flip_high_bit(c: u8) -> u8 {
        let index = ALPHABET.iter().position(|&a| a == c).unwrap();
        ALPHABET[index ^ 0b10_0000]
    }

    fn replace_field(encoded: &str, index: usize, value: &str) -> String {
        let mut fields: Vec<&str> = encoded.split('$').collect();
        fields[index] = value;
        fields.join("$")
    }

    #[test]
    fn default_params_scenario() {
        let hashed = hash_password("correct horse battery staple", &HashParams::default()).unwrap();

        assert!(hashed.as_str().starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
        assert!(verify_password("correct horse battery staple", &hashed).unwrap());
        assert!(!verify_password("Correct Horse Battery Staple", &hashed).unwrap());
    }

    #[rstest]
    #[case("hunter22")]
    #[case("")]
    #[case("pässwörd with ünïcödé")]
    #[case("a password that is quite a bit longer than the derived key length")]
    fn verifies_own_hash(cheap: HashParams, #[case] password: &str) {
        let hashed = hash_password(password, &cheap).unwrap();
        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("something else", &hashed).unwrap());
    }

    #[rstest]
    fn salts_differ_between_calls(cheap: HashParams) {
        let first = hash_password("same password", &cheap).unwrap();
        let second = hash_password("same password", &cheap).unwrap();

        assert_ne!(first, second);
        assert!(verify_password("same password", &first).unwrap());
        assert!(verify_password("same password", &second).unwrap());
    }

    #[rstest]
    fn concurrent_calls_are_independent(cheap: HashParams) {
        std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|i| {
                    scope.spawn(move || {
                        let password = format!("password {i}");
                        let hashed = hash_password(&password, &cheap).unwrap();
                        assert!(verify_password(&password, &hashed).unwrap());
                        assert!(!verify_password("password", &hashed).unwrap());
                        hashed
                    })
                })
                .collect();

            let hashes: Vec<HashedPassword> =
                workers.into_iter().map(|w| w.join().unwrap()).collect();
            for (i, hashed) in hashes.iter().enumerate() {
                let copies = hashes.iter().filter(|h| *h == hashed).count();
                assert_eq!(copies, 1, "hash {i} repeated");
            }
        });
    }

    #[rstest]
    fn embeds_configured_lengths(cheap: HashParams) {
        let params = HashParams {
            key_len: 24,
            salt_len: 12,
            ..cheap
        };
        let hashed = hash_password("pw", &params).unwrap();
        let decoded: PhcString = hashed.as_str().parse().unwrap();

        assert_eq!(decoded.salt.len(), 12);
        assert_eq!(decoded.key.len(), 24);
        assert_eq!(decoded.memory_kib, 64);
    }

    #[rstest]
    fn same_salt_is_deterministic(cheap: HashParams) {
        let first = hash_password_with_rng("pw", &cheap, &mut FixedRng(7)).unwrap();
        let second = hash_password_with_rng("pw", &cheap, &mut FixedRng(7)).unwrap();
        assert_eq!(first, second);
    }

    #[rstest]
    fn random_source_failure_is_reported(cheap: HashParams) {
        let result = hash_password_with_rng("pw", &cheap, &mut BrokenRng);
        assert!(matches!(result, Err(HashError::RandomSource(msg)) if msg.contains("exhausted")));
    }

    #[rstest]
    fn verification_uses_embedded_params(cheap: HashParams) {
        // produced under different settings than the verifier's defaults
        let params = HashParams {
            time_cost: 3,
            key_len: 16,
            ..cheap
        };
        let hashed = hash_password("legacy", &params).unwrap();

        assert!(verify_password("legacy", &hashed).unwrap());
        assert!(!verify_password("legacy!", &hashed).unwrap());
    }

    #[rstest]
    fn tampered_key_is_a_mismatch(cheap: HashParams) {
        let hashed = hash_password("pw", &cheap).unwrap();
        let key = hashed.as_str().rsplit('$').next().unwrap().to_string();

        for i in 0..key.len() {
            let mut bytes = key.clone().into_bytes();
            bytes[i] = flip_high_bit(bytes[i]);
            let flipped = String::from_utf8(bytes).unwrap();
            let tampered = HashedPassword::new(replace_field(hashed.as_str(), 5, &flipped));

            assert!(
                !verify_password("pw", &tampered).unwrap(),
                "flip at {i} still verified"
            );
        }
    }

    #[rstest]
    fn tampered_params_are_a_mismatch(cheap: HashParams) {
        let hashed = hash_password("pw", &cheap).unwrap();
        let tampered = HashedPassword::new(replace_field(hashed.as_str(), 3, "m=64,t=2,p=1"));
        assert!(!verify_password("pw", &tampered).unwrap());
    }

    #[rstest]
    fn truncated_hash_is_malformed(cheap: HashParams) {
        let hashed = hash_password("pw", &cheap).unwrap();
        let truncated = hashed.as_str().rsplit_once('$').unwrap().0.to_string();

        assert!(matches!(
            verify_password("pw", &HashedPassword::new(truncated)),
            Err(HashError::MalformedFormat(_))
        ));
    }

    #[rstest]
    fn unknown_algorithm_is_rejected(cheap: HashParams) {
        let hashed = hash_password("pw", &cheap).unwrap();
        let swapped = HashedPassword::new(replace_field(hashed.as_str(), 1, "scrypt"));

        assert!(matches!(
            verify_password("pw", &swapped),
            Err(HashError::UnsupportedAlgorithm(_))
        ));
    }

    #[rstest]
    fn unknown_parameter_is_rejected(cheap: HashParams) {
        let hashed = hash_password("pw", &cheap).unwrap();
        let swapped = HashedPassword::new(replace_field(hashed.as_str(), 3, "m=64,t=1,x=5"));

        assert!(matches!(
            verify_password("pw", &swapped),
            Err(HashError::ParameterFormat(_))
        ));
    }

    #[rstest]
    fn non_base64_salt_is_rejected(cheap: HashParams) {
        let hashed = hash_password("pw", &cheap).unwrap();
        let swapped = HashedPassword::new(replace_field(hashed.as_str(), 4, "not base64!"));

        assert!(matches!(
            verify_password("pw", &swapped),
            Err(HashError::Encoding { field: "salt", .. })
        ));
    }

    #[test]
    fn short_salt_is_a_derivation_error() {
        // 4-byte salt decodes fine but Argon2 requires at least 8
        let encoded = "$argon2id$v=19$m=64,t=1,p=1$AAAAAA$AAAAAAAAAAAAAAAAAAAAAA";
        assert!(matches!(
            verify_password("pw", &HashedPassword::new(encoded.to_string())),
            Err(HashError::Derivation(_))
        ));
    }

    #[rstest]
    #[case(b"", b"", true)]
    #[case(b"hello", b"hello", true)]
    #[case(b"hello", b"hellp", false)]
    #[case(b"hello", b"jello", false)]
    #[case(b"short", b"shorter", false)]
    #[case(b"shorter", b"short", false)]
    #[case(b"", b"\0", false)]
    fn constant_time_eq_compares_full_length(#[case] a: &[u8], #[case] b: &[u8], #[case] expected: bool) {
        assert_eq!(constant_time_eq(a, b), expected);
    }

    #[rstest]
    fn hasher_service_round_trip(cheap: HashParams) {
        let hasher = Argon2PasswordHasher::new(cheap);
        let hashed = hasher.hash("service password").unwrap();

        assert!(hasher.verify("service password", &hashed).unwrap());
        assert!(!hasher.verify("Service password", &hashed).unwrap());
        assert!(matches!(
            hasher.verify("service password", &HashedPassword::new("garbage".to_string())),
            Err(DomainError::Hash(HashError::MalformedFormat(_)))
        ));
    }
}
