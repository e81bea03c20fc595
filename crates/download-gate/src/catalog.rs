//! Product catalog: maps public slugs to the archive stored for them.

/// Namespace every product archive lives under in the object store.
pub const STORAGE_PREFIX: &str = "products/";

/// Compiled-in product table, in the order slugs are advertised to clients.
///
/// Several slugs may point at the same archive (subscription tiers share the
/// vault bundle).
const BUILTIN_PRODUCTS: &[(&str, &str)] = &[
    ("platinum-sample-pack", "Platinum_Sample_Pack.zip"),
    ("full-platinum-vault", "Full_Platinum_Vault.zip"),
    ("pro-monthly-5k", "Full_Platinum_Vault.zip"),
    ("pro-monthly-10k", "Full_Platinum_Vault.zip"),
    ("enterprise-annual", "Enterprise_Annual.zip"),
];

/// Immutable slug → filename mapping.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    entries: &'static [(&'static str, &'static str)],
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_PRODUCTS,
        }
    }

    /// Build a catalog over a caller-provided static table.
    pub const fn from_static(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// Filename for `slug`, if the slug is known. Matching is exact.
    pub fn resolve(&self, slug: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(s, _)| *s == slug)
            .map(|(_, filename)| *filename)
    }

    /// All known slugs, in table order.
    pub fn slugs(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(slug, _)| *slug).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Object-store key for a product archive.
pub fn storage_key(filename: &str) -> String {
    format!("{STORAGE_PREFIX}{filename}")
}
