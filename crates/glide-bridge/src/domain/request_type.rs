//! Operation tags understood by the native engine.
//!
//! Numbering matches the engine's request-type table so the raw value can be
//! passed through the boundary unchanged. Only the subset the bridge itself
//! needs to reason about is listed; anything else goes through
//! [`RequestType::CustomCommand`].

use crate::domain::reply::Reply;
use serde::{Deserialize, Serialize};

/// Tag attached to every dispatched operation.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    InvalidRequest = 0,
    /// All arguments, including the command name, are supplied by the caller.
    CustomCommand = 1,
    GetString = 2,
    SetString = 3,
    Ping = 4,
    Info = 5,
    Del = 6,
    Select = 7,
    ConfigGet = 8,
    ConfigSet = 9,
    ConfigResetStat = 10,
    ConfigRewrite = 11,
    ClientGetName = 12,
    ClientId = 14,
    ClientSetName = 23,
    Expire = 26,
    HashSet = 27,
    HashGet = 28,
    HashDel = 29,
    MGet = 31,
    MSet = 32,
    Incr = 33,
    IncrBy = 34,
    Decr = 35,
    LPush = 43,
    LPop = 44,
    RPush = 45,
    RPop = 46,
    LLen = 47,
    LTrim = 50,
    SAdd = 51,
    Exists = 58,
    TTL = 60,
    Echo = 70,
}

impl RequestType {
    /// Every known tag, in numeric order.
    pub const ALL: [RequestType; 34] = [
        RequestType::InvalidRequest,
        RequestType::CustomCommand,
        RequestType::GetString,
        RequestType::SetString,
        RequestType::Ping,
        RequestType::Info,
        RequestType::Del,
        RequestType::Select,
        RequestType::ConfigGet,
        RequestType::ConfigSet,
        RequestType::ConfigResetStat,
        RequestType::ConfigRewrite,
        RequestType::ClientGetName,
        RequestType::ClientId,
        RequestType::ClientSetName,
        RequestType::Expire,
        RequestType::HashSet,
        RequestType::HashGet,
        RequestType::HashDel,
        RequestType::MGet,
        RequestType::MSet,
        RequestType::Incr,
        RequestType::IncrBy,
        RequestType::Decr,
        RequestType::LPush,
        RequestType::LPop,
        RequestType::RPush,
        RequestType::RPop,
        RequestType::LLen,
        RequestType::LTrim,
        RequestType::SAdd,
        RequestType::Exists,
        RequestType::TTL,
        RequestType::Echo,
    ];

    /// Decode a raw tag. Unknown values yield `None`.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_raw() == raw)
    }

    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    /// Whether this tag may be submitted to the engine at all.
    pub const fn is_submittable(self) -> bool {
        !matches!(self, RequestType::InvalidRequest)
    }

    /// Reply produced when the engine reports success with no payload.
    ///
    /// Commands whose normal answer is a status line map to an
    /// acknowledgement; everything else, including custom commands, maps to
    /// "no value". The payload is never inspected to decide this.
    pub fn null_reply(self) -> Reply {
        match self {
            RequestType::SetString
            | RequestType::Ping
            | RequestType::Select
            | RequestType::ConfigSet
            | RequestType::ConfigResetStat
            | RequestType::ConfigRewrite
            | RequestType::ClientSetName
            | RequestType::MSet
            | RequestType::LTrim => Reply::Ok,
            _ => Reply::Nil,
        }
    }

    /// Command name as sent on the wire, where the tag fixes it.
    pub const fn command_name(self) -> Option<&'static str> {
        let name = match self {
            RequestType::InvalidRequest | RequestType::CustomCommand => return None,
            RequestType::GetString => "GET",
            RequestType::SetString => "SET",
            RequestType::Ping => "PING",
            RequestType::Info => "INFO",
            RequestType::Del => "DEL",
            RequestType::Select => "SELECT",
            RequestType::ConfigGet => "CONFIG GET",
            RequestType::ConfigSet => "CONFIG SET",
            RequestType::ConfigResetStat => "CONFIG RESETSTAT",
            RequestType::ConfigRewrite => "CONFIG REWRITE",
            RequestType::ClientGetName => "CLIENT GETNAME",
            RequestType::ClientId => "CLIENT ID",
            RequestType::ClientSetName => "CLIENT SETNAME",
            RequestType::Expire => "EXPIRE",
            RequestType::HashSet => "HSET",
            RequestType::HashGet => "HGET",
            RequestType::HashDel => "HDEL",
            RequestType::MGet => "MGET",
            RequestType::MSet => "MSET",
            RequestType::Incr => "INCR",
            RequestType::IncrBy => "INCRBY",
            RequestType::Decr => "DECR",
            RequestType::LPush => "LPUSH",
            RequestType::LPop => "LPOP",
            RequestType::RPush => "RPUSH",
            RequestType::RPop => "RPOP",
            RequestType::LLen => "LLEN",
            RequestType::LTrim => "LTRIM",
            RequestType::SAdd => "SADD",
            RequestType::Exists => "EXISTS",
            RequestType::TTL => "TTL",
            RequestType::Echo => "ECHO",
        };
        Some(name)
    }

    /// Reverse of [`command_name`](Self::command_name), case-insensitive.
    pub fn from_command_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.command_name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }
}

impl TryFrom<u32> for RequestType {
    type Error = u32;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::from_raw(raw).ok_or(raw)
    }
}
