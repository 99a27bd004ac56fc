use convert_case::{Case, Casing};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

///
/// BackendKind
///
/// One bit per storage backend so column exclusions can be expressed as a
/// mask. `Unspecified` is the zero value and never a real backend.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
#[repr(u16)]
pub enum BackendKind {
    #[default]
    Unspecified = 0x0000,
    Search = 0x0001,
    KeyValue = 0x0002,
    Document = 0x0004,
    MySql = 0x0008,
    Postgres = 0x0010,
}

impl BackendKind {
    #[must_use]
    pub const fn bit(self) -> u16 {
        self as u16
    }

    #[must_use]
    pub const fn is_relational(self) -> bool {
        matches!(self, Self::MySql | Self::Postgres)
    }
}

///
/// BackendMask
///
/// Set of backends, stored as the union of `BackendKind` bits.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BackendMask(u16);

impl BackendMask {
    pub const EMPTY: Self = Self(0);

    /// Every concrete backend.
    pub const SUPPORTED: Self = Self(
        BackendKind::Search.bit()
            | BackendKind::KeyValue.bit()
            | BackendKind::Document.bit()
            | BackendKind::MySql.bit()
            | BackendKind::Postgres.bit(),
    );

    #[must_use]
    pub const fn contains(self, backend: BackendKind) -> bool {
        self.0 & backend.bit() == backend.bit()
    }

    #[must_use]
    pub const fn with(self, backend: BackendKind) -> Self {
        Self(self.0 | backend.bit())
    }

    #[must_use]
    pub const fn without(self, backend: BackendKind) -> Self {
        Self(self.0 & !backend.bit())
    }

    /// `SUPPORTED` minus the given backends, for allow-list style exclusions.
    #[must_use]
    pub fn supported_except(backends: &[BackendKind]) -> Self {
        backends
            .iter()
            .fold(Self::SUPPORTED, |mask, backend| mask.without(*backend))
    }
}

impl From<BackendKind> for BackendMask {
    fn from(backend: BackendKind) -> Self {
        Self(backend.bit())
    }
}

impl BitOr<BackendKind> for BackendMask {
    type Output = Self;

    fn bitor(self, rhs: BackendKind) -> Self {
        self.with(rhs)
    }
}

impl BitOrAssign<BackendKind> for BackendMask {
    fn bitor_assign(&mut self, rhs: BackendKind) {
        *self = self.with(rhs);
    }
}

impl FromIterator<BackendKind> for BackendMask {
    fn from_iter<I: IntoIterator<Item = BackendKind>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::EMPTY, |mask, backend| mask.with(backend))
    }
}

///
/// CasingStyle
///
/// The casing collaborator. `apply` is the pure `name × style -> name`
/// mapping, delegated to `convert_case`.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[remain::sorted]
pub enum CasingStyle {
    Camel,
    Kebab,
    Pascal,
    #[default]
    Same,
    Snake,
}

impl CasingStyle {
    /// Dots delimit path segments and count as word boundaries, so a dotted
    /// relation path cases the same way a spaced phrase would.
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Camel => name.replace('.', " ").to_case(Case::Camel),
            Self::Kebab => name.replace('.', " ").to_case(Case::Kebab),
            Self::Pascal => name.replace('.', " ").to_case(Case::Pascal),
            Self::Same => name.to_owned(),
            Self::Snake => name.replace('.', " ").to_case(Case::Snake),
        }
    }
}

///
/// ColumnDataType
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[remain::sorted]
pub enum ColumnDataType {
    Boolean,
    Date,
    Entity,
    Float,
    Guid,
    Number,
    Text,
    #[default]
    Undetermined,
}

///
/// KeyGenerator
///
/// How a primary key value is produced when absent on write.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[remain::sorted]
pub enum KeyGenerator {
    Guid,
    Identity,
    #[default]
    None,
}

///
/// TimestampEvent
///
/// Buckets of columns auto-stamped on the matching write event.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum TimestampEvent {
    OnCreate,
    OnUpdate,
    OnDelete,
}

impl TimestampEvent {
    pub const COUNT: usize = 3;

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::OnCreate => 0,
            Self::OnUpdate => 1,
            Self::OnDelete => 2,
        }
    }
}
