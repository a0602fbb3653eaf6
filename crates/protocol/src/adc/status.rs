//! The severity and error codes carried by `STA` status messages.

/// How serious a `STA` message is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// `0` - informational, the preceding command otherwise succeeded.
    Success,
    /// `1` - the command failed but the session continues.
    Recoverable,
    /// `2` - the session is no longer usable.
    Fatal,
}

impl Severity {
    /// Parses the single leading severity digit of an `STA` status code.
    #[must_use]
    pub const fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(Self::Success),
            1 => Some(Self::Recoverable),
            2 => Some(Self::Fatal),
            _ => None,
        }
    }

    /// The single leading digit for this severity.
    #[must_use]
    pub const fn as_digit(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Recoverable => 1,
            Self::Fatal => 2,
        }
    }
}

/// The numeric error code making up the last two digits of an `STA` status
/// code, per §7.1 of the ADC protocol draft.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCode {
    /// `00` - generic, no more specific code applies.
    Generic,
    /// `10` - generic hub error.
    HubGeneric,
    /// `11` - the hub is full.
    HubFull,
    /// `12` - the hub is disabled.
    HubDisabled,
    /// `20` - generic login error.
    LoginGeneric,
    /// `21` - the requested nick is invalid.
    NickInvalid,
    /// `22` - the requested nick is already in use.
    NickTaken,
    /// `23` - the supplied password was wrong.
    BadPassword,
    /// `24` - the CID is already registered to another user.
    CidTaken,
    /// `25` - the command requires access the user doesn't have.
    CommandAccess,
    /// `26` - only registered users may perform this action.
    ReggedOnly,
    /// `27` - the supplied PID doesn't match the claimed CID.
    InvalidPid,
    /// `30` - generic ban error.
    BannedGeneric,
    /// `31` - the user is permanently banned.
    PermBanned,
    /// `32` - the user is temporarily banned.
    TempBanned,
    /// `40` - generic protocol error.
    ProtocolGeneric,
    /// `41` - the peer doesn't support a required protocol feature.
    ProtocolUnsupported,
    /// `42` - a C-C connection attempt failed.
    ConnectFailed,
    /// `43` - the peer never sent its `INF`.
    InfMissing,
    /// `44` - a command arrived in a protocol state that doesn't allow it.
    BadState,
    /// `45` - a required feature is missing.
    FeatureMissing,
    /// `46` - the advertised IP address is invalid.
    BadIp,
    /// `47` - no hub hash is available for a keyprint-pinned TLS connection.
    NoHubHash,
    /// `50` - generic transfer error.
    TransferGeneric,
    /// `51` - the requested file isn't available.
    FileNotAvailable,
    /// `52` - the requested file segment isn't available.
    FilePartNotAvailable,
    /// `53` - the peer has no free upload slots.
    SlotsFull,
    /// `54` - the peer sent no client hash for a keyprint-pinned connection.
    NoClientHash,
    /// `55` - an HBRI fallback connection attempt timed out.
    HbriTimeout,
    /// `60` - the requested file exists but access was denied.
    FileAccessDenied,
    /// `61` - the referenced user is unknown or offline.
    UnknownUser,
    /// `62` - the peer requires TLS for this connection.
    TlsRequired,
}

impl ErrorCode {
    /// Parses the two-digit error code following the severity digit.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Generic,
            10 => Self::HubGeneric,
            11 => Self::HubFull,
            12 => Self::HubDisabled,
            20 => Self::LoginGeneric,
            21 => Self::NickInvalid,
            22 => Self::NickTaken,
            23 => Self::BadPassword,
            24 => Self::CidTaken,
            25 => Self::CommandAccess,
            26 => Self::ReggedOnly,
            27 => Self::InvalidPid,
            30 => Self::BannedGeneric,
            31 => Self::PermBanned,
            32 => Self::TempBanned,
            40 => Self::ProtocolGeneric,
            41 => Self::ProtocolUnsupported,
            42 => Self::ConnectFailed,
            43 => Self::InfMissing,
            44 => Self::BadState,
            45 => Self::FeatureMissing,
            46 => Self::BadIp,
            47 => Self::NoHubHash,
            50 => Self::TransferGeneric,
            51 => Self::FileNotAvailable,
            52 => Self::FilePartNotAvailable,
            53 => Self::SlotsFull,
            54 => Self::NoClientHash,
            55 => Self::HbriTimeout,
            60 => Self::FileAccessDenied,
            61 => Self::UnknownUser,
            62 => Self::TlsRequired,
            _ => return None,
        })
    }

    /// The two-digit wire value for this error code.
    #[must_use]
    pub const fn as_code(self) -> u8 {
        match self {
            Self::Generic => 0,
            Self::HubGeneric => 10,
            Self::HubFull => 11,
            Self::HubDisabled => 12,
            Self::LoginGeneric => 20,
            Self::NickInvalid => 21,
            Self::NickTaken => 22,
            Self::BadPassword => 23,
            Self::CidTaken => 24,
            Self::CommandAccess => 25,
            Self::ReggedOnly => 26,
            Self::InvalidPid => 27,
            Self::BannedGeneric => 30,
            Self::PermBanned => 31,
            Self::TempBanned => 32,
            Self::ProtocolGeneric => 40,
            Self::ProtocolUnsupported => 41,
            Self::ConnectFailed => 42,
            Self::InfMissing => 43,
            Self::BadState => 44,
            Self::FeatureMissing => 45,
            Self::BadIp => 46,
            Self::NoHubHash => 47,
            Self::TransferGeneric => 50,
            Self::FileNotAvailable => 51,
            Self::FilePartNotAvailable => 52,
            Self::SlotsFull => 53,
            Self::NoClientHash => 54,
            Self::HbriTimeout => 55,
            Self::FileAccessDenied => 60,
            Self::UnknownUser => 61,
            Self::TlsRequired => 62,
        }
    }

    /// Formats the combined `<severity><code>` three-digit status code, e.g.
    /// `251` for a recoverable `CommandAccess` error.
    #[must_use]
    pub fn wire_code(self, severity: Severity) -> String {
        format!("{}{:02}", severity.as_digit(), self.as_code())
    }
}
