//! Value objects shared across the domain.

use std::fmt;

use super::error::ValueObjectError;

const MAX_IDENTIFIER_LEN: usize = 64;

fn validate_identifier(kind: &'static str, value: &str) -> Result<(), ValueObjectError> {
    if value.is_empty() {
        return Err(ValueObjectError::Empty(kind));
    }
    if value.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(ValueObjectError::TooLong {
            kind,
            max: MAX_IDENTIFIER_LEN,
        });
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValueObjectError::InvalidCharacter(kind));
    }
    Ok(())
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                validate_identifier($kind, &value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValueObjectError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Connection identifier of a worker node or admin observer.
    ClientId,
    "client_id"
);

identifier!(
    /// Name of a computation session.
    RoomId,
    "room_id"
);

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed from `earlier` to `self`, never negative.
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        (self.0 - earlier.0).max(0)
    }
}

/// Sequence number of a job within a room; stamped on every task as a fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct JobId(u64);

impl JobId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// An individual of the population: an ordered sequence of gene symbols.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chromosome(Vec<String>);

impl Chromosome {
    pub fn new(genes: Vec<String>) -> Self {
        Self(genes)
    }

    pub fn genes(&self) -> &[String] {
        &self.0
    }

    pub fn into_genes(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Genes concatenated into one string, as stored in run history.
    pub fn summary(&self) -> String {
        self.0.concat()
    }
}

impl From<Vec<&str>> for Chromosome {
    fn from(genes: Vec<&str>) -> Self {
        Self(genes.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_accepts_plain_identifier() {
        // テスト項目: 通常の識別子は ClientId として受け付けられる
        // given (前提条件):
        let raw = "worker-01".to_string();

        // when (操作):
        let result = ClientId::new(raw);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "worker-01");
    }

    #[test]
    fn test_client_id_rejects_empty() {
        // テスト項目: 空文字列は拒否される
        assert_eq!(
            ClientId::new(String::new()),
            Err(ValueObjectError::Empty("client_id"))
        );
    }

    #[test]
    fn test_room_id_rejects_whitespace_and_overlong_values() {
        // テスト項目: 空白を含む値と長すぎる値は拒否される
        // given (前提条件):
        let with_space = "genetic alg".to_string();
        let overlong = "r".repeat(MAX_IDENTIFIER_LEN + 1);

        // when (操作):
        let space_result = RoomId::new(with_space);
        let long_result = RoomId::new(overlong);

        // then (期待する結果):
        assert_eq!(
            space_result,
            Err(ValueObjectError::InvalidCharacter("room_id"))
        );
        assert!(matches!(
            long_result,
            Err(ValueObjectError::TooLong { kind: "room_id", .. })
        ));
    }

    #[test]
    fn test_timestamp_millis_since_never_negative() {
        // テスト項目: 経過時間は負にならない
        let earlier = Timestamp::new(2_000);
        let later = Timestamp::new(3_500);
        assert_eq!(later.millis_since(earlier), 1_500);
        assert_eq!(earlier.millis_since(later), 0);
    }

    #[test]
    fn test_chromosome_summary_concatenates_genes() {
        // テスト項目: 染色体のサマリーは遺伝子の連結になる
        let chromosome = Chromosome::from(vec!["a", "b", "c"]);
        assert_eq!(chromosome.summary(), "abc");
        assert_eq!(chromosome.len(), 3);
    }
}
