use rand::Rng;
use uuid::Uuid;

/// Source of locally-unique ids for cohort groups and criteria.
///
/// Injected into every constructor that mints ids so tree construction is
/// deterministic under test.
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Random five-digit ids, the shape the web editor attaches to local groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&mut self) -> String {
        let mut rng = rand::thread_rng();
        (0..5).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect()
    }
}

/// UUID-backed ids for contexts that need global uniqueness.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic sequential ids for tests.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    counter: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("id-{}", self.counter)
    }
}
