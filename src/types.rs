use core::fmt;

use bitflags::bitflags;

bitflags! {
    /// Static result kinds an operator may declare.
    ///
    /// A child typed `OBJECT` is unknown at bind time and satisfies every
    /// requirement; the concrete kind is only checked during evaluation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReturnType: u8 {
        const BOOLEAN = 1;
        const NUMBER = 1 << 1;
        const OBJECT = 1 << 2;
        const STRING = 1 << 3;
        const ARRAY = 1 << 4;
    }
}

impl ReturnType {
    /// Any kind at all, used by validators that accept every child.
    pub const ANY: ReturnType = ReturnType::all();

    /// Whether a child of static type `found` may fill a slot requiring `self`.
    pub fn accepts(self, found: ReturnType) -> bool {
        found.contains(ReturnType::OBJECT) || self.intersects(found)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == ReturnType::ANY {
            return write!(f, "Any");
        }
        let names: Vec<&str> = self
            .iter_names()
            .map(|(name, _)| match name {
                "BOOLEAN" => "Boolean",
                "NUMBER" => "Number",
                "OBJECT" => "Object",
                "STRING" => "String",
                "ARRAY" => "Array",
                other => other,
            })
            .collect();
        write!(f, "{}", names.join("|"))
    }
}
