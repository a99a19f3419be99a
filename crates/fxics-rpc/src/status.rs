//! RPC-surfaced error codes (§6, §7).

macro_rules! make_error_code {
    ($($name:ident = $value:literal: $description:literal,)+) => {
        /// Error codes a dispatcher may place in a reply's `error_code` field.
        ///
        /// `Malformed` is internal: it never reaches the wire, it is mapped to
        /// `InvalidParameter` at the dispatch boundary (§7).
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        #[repr(u32)]
        pub enum ErrorCode {
            $(
                #[doc = $description]
                $name = $value,
            )+
        }

        impl std::fmt::Display for ErrorCode {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let description = match self {
                    $(ErrorCode::$name => $description,)+
                };
                write!(f, "{} ({:#010x})", description, *self as u32)
            }
        }

        impl ErrorCode {
            pastey::paste! {
                $(
                    #[doc = concat!("[`ErrorCode::", stringify!($name), "`] as u32")]
                    pub const [<U32_ $name:snake:upper>]: u32 = $value;
                )+
            }
        }
    };
}

make_error_code! {
    Success = 0x0000_0000: "Success",
    InvalidObject = 0x8004_0102: "Invalid Object",
    InvalidParameter = 0x8004_0104: "Invalid Parameter",
    NotFound = 0x8004_0105: "Not Found",
    NoSupport = 0x8004_0106: "No Support",
    NotInitialized = 0x8004_0107: "Not Initialized",
    Malformed = 0x8004_0108: "Malformed",
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Success
    }
}
