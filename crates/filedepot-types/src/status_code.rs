/// Status code type alias; codes are grouped by range.
#[allow(non_camel_case_types)]
pub type status_code_t = u16;

/// Common status codes (0-999).
pub mod StatusCode {
    use super::status_code_t;

    pub const OK: status_code_t = 0;
    pub const NOT_IMPLEMENTED: status_code_t = 1;
    pub const INVALID_ARG: status_code_t = 3;
    pub const INVALID_CONFIG: status_code_t = 4;
    pub const RESOURCE_EXHAUSTED: status_code_t = 10;
    pub const IO_ERROR: status_code_t = 69;
    pub const UNKNOWN: status_code_t = 999;
}

/// RPC status codes (2xxx).
pub mod RPCCode {
    use super::status_code_t;

    pub const INVALID_MESSAGE_TYPE: status_code_t = 2000;
    pub const TIMEOUT: status_code_t = 2005;
    pub const SEND_FAILED: status_code_t = 2007;
    pub const INVALID_SERVICE_ID: status_code_t = 2008;
    pub const INVALID_METHOD_ID: status_code_t = 2009;
    pub const SOCKET_ERROR: status_code_t = 2010;
    pub const LISTEN_FAILED: status_code_t = 2011;
    pub const SOCKET_CLOSED: status_code_t = 2013;
    pub const CONNECT_FAILED: status_code_t = 2014;
}

/// File service status codes (3xxx).
pub mod FileCode {
    use super::status_code_t;

    pub const NOT_FOUND: status_code_t = 3000;
    pub const INFO_NOT_RECEIVED: status_code_t = 3001;
    pub const DUPLICATE_INFO: status_code_t = 3002;
    pub const CREATE_FAILED: status_code_t = 3003;
    pub const READ_FAILED: status_code_t = 3004;
    pub const WRITE_FAILED: status_code_t = 3005;
    pub const WALK_FAILED: status_code_t = 3006;
    pub const OUTSIDE_ROOT: status_code_t = 3007;
    pub const IS_DIRECTORY: status_code_t = 3008;
}

/// Classification of status code ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum StatusCodeType {
    Invalid = -1,
    Common = 0,
    RPC = 2,
    File = 3,
}

/// Determine the type/category of a status code.
pub fn type_of(code: status_code_t) -> StatusCodeType {
    match code {
        0..=999 => StatusCodeType::Common,
        2000..=2999 => StatusCodeType::RPC,
        3000..=3999 => StatusCodeType::File,
        _ => StatusCodeType::Invalid,
    }
}

/// Convert a status code to its human-readable name.
pub fn to_string(code: status_code_t) -> &'static str {
    match code {
        // Common
        StatusCode::OK => "OK",
        StatusCode::NOT_IMPLEMENTED => "NotImplemented",
        StatusCode::INVALID_ARG => "InvalidArg",
        StatusCode::INVALID_CONFIG => "InvalidConfig",
        StatusCode::RESOURCE_EXHAUSTED => "ResourceExhausted",
        StatusCode::IO_ERROR => "IOError",
        StatusCode::UNKNOWN => "Unknown",

        // RPC
        RPCCode::INVALID_MESSAGE_TYPE => "RPC::InvalidMessageType",
        RPCCode::TIMEOUT => "RPC::Timeout",
        RPCCode::SEND_FAILED => "RPC::SendFailed",
        RPCCode::INVALID_SERVICE_ID => "RPC::InvalidServiceID",
        RPCCode::INVALID_METHOD_ID => "RPC::InvalidMethodID",
        RPCCode::SOCKET_ERROR => "RPC::SocketError",
        RPCCode::LISTEN_FAILED => "RPC::ListenFailed",
        RPCCode::SOCKET_CLOSED => "RPC::SocketClosed",
        RPCCode::CONNECT_FAILED => "RPC::ConnectFailed",

        // File
        FileCode::NOT_FOUND => "File::NotFound",
        FileCode::INFO_NOT_RECEIVED => "File::InfoNotReceived",
        FileCode::DUPLICATE_INFO => "File::DuplicateInfo",
        FileCode::CREATE_FAILED => "File::CreateFailed",
        FileCode::READ_FAILED => "File::ReadFailed",
        FileCode::WRITE_FAILED => "File::WriteFailed",
        FileCode::WALK_FAILED => "File::WalkFailed",
        FileCode::OUTSIDE_ROOT => "File::OutsideRoot",
        FileCode::IS_DIRECTORY => "File::IsDirectory",

        _ => "UnknownStatusCode",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_values() {
        assert_eq!(StatusCode::OK, 0);
        assert_eq!(StatusCode::UNKNOWN, 999);
        assert_eq!(RPCCode::INVALID_MESSAGE_TYPE, 2000);
        assert_eq!(FileCode::NOT_FOUND, 3000);
    }

    #[test]
    fn test_type_of() {
        assert_eq!(type_of(StatusCode::OK), StatusCodeType::Common);
        assert_eq!(type_of(StatusCode::RESOURCE_EXHAUSTED), StatusCodeType::Common);
        assert_eq!(type_of(RPCCode::TIMEOUT), StatusCodeType::RPC);
        assert_eq!(type_of(FileCode::NOT_FOUND), StatusCodeType::File);
        assert_eq!(type_of(4000), StatusCodeType::Invalid);
        assert_eq!(type_of(65535), StatusCodeType::Invalid);
    }

    #[test]
    fn test_to_string() {
        assert_eq!(to_string(StatusCode::OK), "OK");
        assert_eq!(to_string(StatusCode::RESOURCE_EXHAUSTED), "ResourceExhausted");
        assert_eq!(to_string(RPCCode::SOCKET_CLOSED), "RPC::SocketClosed");
        assert_eq!(to_string(FileCode::INFO_NOT_RECEIVED), "File::InfoNotReceived");
        assert_eq!(to_string(12345), "UnknownStatusCode");
    }
}
