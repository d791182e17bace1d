use std::fmt;
use std::ops::BitAnd;
use std::ops::BitOr;
use std::ops::BitOrAssign;

/// Mask over the kinds of mutation a raw event reports, also used as the
/// requested-event mask when subscribing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NotifyFlags(u32);

impl NotifyFlags {
    /// Fired synchronously on registration to report current state
    pub const IMMEDIATE: NotifyFlags = NotifyFlags(0x01);
    /// Mutation originated in this process
    pub const LOCAL: NotifyFlags = NotifyFlags(0x02);
    pub const NEW: NotifyFlags = NotifyFlags(0x04);
    pub const DELETE: NotifyFlags = NotifyFlags(0x08);
    /// Value changed
    pub const UPDATE: NotifyFlags = NotifyFlags(0x10);
    pub const FLAGS: NotifyFlags = NotifyFlags(0x20);

    const NAMES: [(NotifyFlags, &'static str); 6] = [
        (Self::IMMEDIATE, "IMMEDIATE"),
        (Self::LOCAL, "LOCAL"),
        (Self::NEW, "NEW"),
        (Self::DELETE, "DELETE"),
        (Self::UPDATE, "UPDATE"),
        (Self::FLAGS, "FLAGS"),
    ];

    pub const fn empty() -> Self {
        NotifyFlags(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        NotifyFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `other` is set.
    pub const fn contains(
        self,
        other: NotifyFlags,
    ) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any bit of `other` is set.
    pub const fn intersects(
        self,
        other: NotifyFlags,
    ) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(
        self,
        other: NotifyFlags,
    ) -> Self {
        NotifyFlags(self.0 | other.0)
    }

    pub const fn difference(
        self,
        other: NotifyFlags,
    ) -> Self {
        NotifyFlags(self.0 & !other.0)
    }
}

impl BitOr for NotifyFlags {
    type Output = NotifyFlags;

    fn bitor(
        self,
        rhs: Self,
    ) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOrAssign for NotifyFlags {
    fn bitor_assign(
        &mut self,
        rhs: Self,
    ) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for NotifyFlags {
    type Output = NotifyFlags;

    fn bitand(
        self,
        rhs: Self,
    ) -> Self::Output {
        NotifyFlags(self.0 & rhs.0)
    }
}

impl fmt::Debug for NotifyFlags {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NotifyFlags(empty)");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "NotifyFlags({})", names.join(" | "))
    }
}
