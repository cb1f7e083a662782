use std::{
    fmt,
    sync::atomic::{AtomicI64, Ordering},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Last id handed out by [`next_id`], in milliseconds since the Unix epoch.
static LAST_ISSUED: AtomicI64 = AtomicI64::new(0);

/// Issue a fresh id derived from the wall clock.
///
/// Ids are decimal millisecond timestamps. Two calls never return the same
/// value within a process: if the clock has not advanced (or went
/// backwards), the previous id plus one is used instead.
pub(crate) fn next_id() -> String {
    let now = Utc::now().timestamp_millis();
    let mut prev = LAST_ISSUED.load(Ordering::Acquire);
    loop {
        let candidate = now.max(prev + 1);
        match LAST_ISSUED.compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => return candidate.to_string(),
            Err(actual) => prev = actual,
        }
    }
}

/// Make sure future ids sort after `id` if it is numeric.
///
/// Called with ids read back from storage so a clock that moved backwards
/// since the last run cannot produce a duplicate.
pub(crate) fn advance_past(id: &str) {
    if let Ok(value) = id.parse::<i64>() {
        LAST_ISSUED.fetch_max(value, Ordering::AcqRel);
    }
}

/// Unique identifier of a [`Folder`](crate::Folder).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(String);

/// Unique identifier of a [`Recording`](crate::Recording) within its folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordingId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Issue a new id from the process-wide monotonic clock.
            pub fn generate() -> Self {
                Self(next_id())
            }

            /// View the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(FolderId);
string_id!(RecordingId);
