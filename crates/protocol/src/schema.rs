//! Field-path schema
//!
//! The ordered table of every field a record may carry, with its declared
//! kind and whether string values are list-like (joined with `LIST_SEP`).
//!
//! Order matters: the transcoder walks `FIELDS` front to back, so output
//! maps and sub-structures are always populated in the same order.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::ProtocolError;

/// Separator used by list-like string fields
pub const LIST_SEP: &str = ",";

/// Declared kind of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int,
    Str,
    Bool,
}

impl FieldKind {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Str => "string",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named sub-structure addressed by the middle segment of a 3-segment path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Proc,
    Pproc,
    Net,
    File,
    Flow,
    Container,
    Node,
}

impl Domain {
    /// All domains in output order
    pub const ALL: [Domain; 7] = [
        Self::Proc,
        Self::Pproc,
        Self::Net,
        Self::File,
        Self::Flow,
        Self::Container,
        Self::Node,
    ];

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proc => "proc",
            Self::Pproc => "pproc",
            Self::Net => "net",
            Self::File => "file",
            Self::Flow => "flow",
            Self::Container => "container",
            Self::Node => "node",
        }
    }

    /// Parse the middle segment of a field path
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == segment)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Telemetry event type carried in `sf.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Process event (exec, clone, exit)
    ProcEvent,
    /// Process flow
    ProcFlow,
    /// File flow (open, read, write, close)
    FileFlow,
    /// File event (rename, unlink, mkdir)
    FileEvent,
    /// Network flow
    NetFlow,
}

impl EventType {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProcEvent => "PE",
            Self::ProcFlow => "PF",
            Self::FileFlow => "FF",
            Self::FileEvent => "FE",
            Self::NetFlow => "NF",
        }
    }

    /// Network-flow types carry the `net` sub-structure
    #[inline]
    pub const fn is_network(self) -> bool {
        matches!(self, Self::NetFlow)
    }

    /// File types carry the `file` sub-structure
    #[inline]
    pub const fn is_file(self) -> bool {
        matches!(self, Self::FileFlow | Self::FileEvent)
    }

    /// Flow types carry the `flow` sub-structure
    #[inline]
    pub const fn is_flow(self) -> bool {
        matches!(self, Self::FileFlow | Self::NetFlow)
    }
}

impl FromStr for EventType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PE" => Ok(Self::ProcEvent),
            "PF" => Ok(Self::ProcFlow),
            "FF" => Ok(Self::FileFlow),
            "FE" => Ok(Self::FileEvent),
            "NF" => Ok(Self::NetFlow),
            other => Err(ProtocolError::InvalidEventType(other.to_string())),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the field table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Dotted path, e.g. `sf.net.sip`
    pub path: &'static str,
    /// Declared value kind
    pub kind: FieldKind,
    /// String value holds `LIST_SEP`-joined items
    pub list: bool,
}

impl FieldDef {
    const fn int(path: &'static str) -> Self {
        Self { path, kind: FieldKind::Int, list: false }
    }

    const fn str(path: &'static str) -> Self {
        Self { path, kind: FieldKind::Str, list: false }
    }

    const fn bool(path: &'static str) -> Self {
        Self { path, kind: FieldKind::Bool, list: false }
    }

    const fn list(path: &'static str) -> Self {
        Self { path, kind: FieldKind::Str, list: true }
    }

    /// Number of dot-separated segments
    #[inline]
    pub fn depth(&self) -> usize {
        self.path.split('.').count()
    }

    /// Last segment of the path (the attribute name in the output)
    #[inline]
    pub fn attr(&self) -> &'static str {
        self.path.rsplit('.').next().unwrap_or(self.path)
    }

    /// Sub-structure for 3-segment paths, `None` for scalars
    pub fn domain(&self) -> Option<Domain> {
        let mut parts = self.path.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(domain), Some(_), None) => Domain::from_segment(domain),
            _ => None,
        }
    }
}

/// Field path constants used outside the table
pub mod field {
    pub const TYPE: &str = "sf.type";
    pub const OPFLAGS: &str = "sf.opflags";
    pub const RET: &str = "sf.ret";
    pub const TS: &str = "sf.ts";
    pub const ENDTS: &str = "sf.endts";
    pub const SCHEMA: &str = "sf.schema";

    pub const PROC_TID: &str = "sf.proc.tid";
    pub const PROC_CREATETS: &str = "sf.proc.createts";
    pub const PPROC_PID: &str = "sf.pproc.pid";

    pub const FILE_OID: &str = "sf.file.oid";

    pub const NET_PROTO: &str = "sf.net.proto";
    pub const NET_SPORT: &str = "sf.net.sport";
    pub const NET_DPORT: &str = "sf.net.dport";
    pub const NET_SIP: &str = "sf.net.sip";
    pub const NET_DIP: &str = "sf.net.dip";

    pub const CONTAINER_ID: &str = "sf.container.id";
    pub const NODE_ID: &str = "sf.node.id";
}

/// Every known field, in output order
pub static FIELDS: &[FieldDef] = &[
    FieldDef::str(field::TYPE),
    FieldDef::list(field::OPFLAGS),
    FieldDef::int(field::RET),
    FieldDef::int(field::TS),
    FieldDef::int(field::ENDTS),
    FieldDef::int(field::SCHEMA),
    // proc
    FieldDef::str("sf.proc.oid"),
    FieldDef::int("sf.proc.pid"),
    FieldDef::str("sf.proc.name"),
    FieldDef::str("sf.proc.exe"),
    FieldDef::str("sf.proc.args"),
    FieldDef::int("sf.proc.uid"),
    FieldDef::str("sf.proc.user"),
    FieldDef::int(field::PROC_TID),
    FieldDef::int("sf.proc.gid"),
    FieldDef::str("sf.proc.group"),
    FieldDef::int(field::PROC_CREATETS),
    FieldDef::bool("sf.proc.tty"),
    FieldDef::bool("sf.proc.entry"),
    FieldDef::str("sf.proc.cmdline"),
    FieldDef::list("sf.proc.aname"),
    FieldDef::list("sf.proc.aexe"),
    FieldDef::list("sf.proc.acmdline"),
    FieldDef::list("sf.proc.apid"),
    // pproc
    FieldDef::str("sf.pproc.oid"),
    FieldDef::int(field::PPROC_PID),
    FieldDef::str("sf.pproc.name"),
    FieldDef::str("sf.pproc.exe"),
    FieldDef::str("sf.pproc.args"),
    FieldDef::int("sf.pproc.uid"),
    FieldDef::str("sf.pproc.user"),
    FieldDef::int("sf.pproc.gid"),
    FieldDef::str("sf.pproc.group"),
    FieldDef::int("sf.pproc.createts"),
    FieldDef::bool("sf.pproc.tty"),
    FieldDef::bool("sf.pproc.entry"),
    FieldDef::str("sf.pproc.cmdline"),
    // file
    FieldDef::str("sf.file.name"),
    FieldDef::str("sf.file.path"),
    FieldDef::str("sf.file.canonicalpath"),
    FieldDef::str(field::FILE_OID),
    FieldDef::str("sf.file.directory"),
    FieldDef::str("sf.file.newname"),
    FieldDef::str("sf.file.newpath"),
    FieldDef::str("sf.file.newcanonicalpath"),
    FieldDef::str("sf.file.newdirectory"),
    FieldDef::str("sf.file.type"),
    FieldDef::bool("sf.file.is_open_write"),
    FieldDef::bool("sf.file.is_open_read"),
    FieldDef::int("sf.file.fd"),
    FieldDef::list("sf.file.openflags"),
    // net
    FieldDef::int(field::NET_PROTO),
    FieldDef::int(field::NET_SPORT),
    FieldDef::int(field::NET_DPORT),
    FieldDef::list("sf.net.port"),
    FieldDef::str(field::NET_SIP),
    FieldDef::str(field::NET_DIP),
    FieldDef::list("sf.net.ip"),
    // flow
    FieldDef::int("sf.flow.rbytes"),
    FieldDef::int("sf.flow.rops"),
    FieldDef::int("sf.flow.wbytes"),
    FieldDef::int("sf.flow.wops"),
    // container
    FieldDef::str(field::CONTAINER_ID),
    FieldDef::str("sf.container.name"),
    FieldDef::str("sf.container.imageid"),
    FieldDef::str("sf.container.image"),
    FieldDef::str("sf.container.type"),
    FieldDef::bool("sf.container.privileged"),
    // node
    FieldDef::str(field::NODE_ID),
    FieldDef::str("sf.node.ip"),
];

/// Look up a field definition by path
pub fn lookup(path: &str) -> Option<&'static FieldDef> {
    static INDEX: OnceLock<HashMap<&'static str, &'static FieldDef>> = OnceLock::new();
    INDEX
        .get_or_init(|| FIELDS.iter().map(|f| (f.path, f)).collect())
        .get(path)
        .copied()
}
