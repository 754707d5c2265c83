//! Sliding window log: a per-key sorted set of event timestamps, pruned on
//! every decision, counted, and appended to only while under the limit.
//!
//! The set member carries a per-invocation uuid suffix (`ARGV[4]`) so two
//! events landing on the same nanosecond tick stay distinct entries instead
//! of the second `ZADD` overwriting the first.

use uuid::Uuid;

use super::Invocation;
use crate::window::Window;

pub const SOURCE: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
local member = ARGV[1] .. ':' .. ARGV[4]
local clear_before = now - window

redis.call('ZREMRANGEBYSCORE', key, 0, clear_before)
local count = redis.call('ZCARD', key)
local allowed = 0
if count < limit then
    redis.call('ZADD', key, now, member)
    allowed = 1
end
local ttl = math.floor(window / 1000000)
if ttl > 0 then
    redis.call('PEXPIRE', key, ttl)
end
return {allowed, count}
"#;

pub(crate) fn invocation(key: &str, now: i64, window: Window, limit: u32) -> Invocation {
    Invocation {
        keys: vec![key.to_string()],
        args: vec![
            now.to_string(),
            window.as_nanos().to_string(),
            limit.to_string(),
            Uuid::new_v4().to_string(),
        ],
    }
}
