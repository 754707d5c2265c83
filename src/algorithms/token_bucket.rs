//! Token bucket: a bucket of `limit` tokens refilled continuously at
//! `limit / window` tokens per nanosecond, stored as two plain keys with a
//! TTL of twice the window.

use super::Invocation;
use crate::window::Window;

pub const SOURCE: &str = r#"
local tokens_key = KEYS[1]
local stamp_key = KEYS[2]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
local rate = limit / window
local ttl = math.floor(window / 1000000) * 2

local tokens = tonumber(redis.call('GET', tokens_key))
if tokens == nil then
    tokens = limit
end
local stamp = tonumber(redis.call('GET', stamp_key))
if stamp == nil then
    stamp = now
end
local delta = math.max(0, now - stamp)
local filled = math.min(limit, tokens + delta * rate)
local allowed = 0
if filled >= 1 then
    allowed = 1
    filled = filled - 1
end
if ttl > 0 then
    redis.call('SET', tokens_key, filled, 'PX', ttl)
    redis.call('SET', stamp_key, now, 'PX', ttl)
else
    redis.call('SET', tokens_key, filled)
    redis.call('SET', stamp_key, now)
end
return {allowed, math.floor(filled)}
"#;

pub(crate) fn invocation(key: &str, now: i64, window: Window, limit: u32) -> Invocation {
    Invocation {
        keys: vec![format!("{key}:tokens"), format!("{key}:stamp")],
        args: vec![
            now.to_string(),
            window.as_nanos().to_string(),
            limit.to_string(),
        ],
    }
}
