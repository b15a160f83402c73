//! # Innate Primitives
//!
//! Fixed vocabularies and limits compiled into the engine.
//!
//! These tables are immutable at runtime:
//! 1. **PMOD abbreviations**: default protein-modification types to their BEL short form.
//! 2. **Species namespaces**: gene-symbol namespaces to NCBI taxonomy ids.
//! 3. **Input limits**: bounds on document size and term nesting.

/// File suffix of importable BEL JSON documents.
pub const BEL_JSON_SUFFIX: &str = ".bel.json";

/// Maximum size of a single BEL JSON document (256 MB).
pub const MAX_DOCUMENT_SIZE: u64 = 256 * 1024 * 1024;

/// Maximum nesting depth of a term tree.
///
/// Deeper trees are rejected as invalid terms instead of recursing without bound.
pub const MAX_TERM_DEPTH: usize = 64;

/// Maximum depth followed through structural edges by the species and involved updates.
pub const MAX_STRUCTURAL_DEPTH: usize = 16;

// =============================================================================
// PROTEIN MODIFICATIONS
// =============================================================================

/// Default BEL protein-modification types and their abbreviations.
const PMOD_ABBREVIATIONS: &[(&str, &str)] = &[
    ("pmod_ace", "Ac"),
    ("pmod_adr", "ADPRib"),
    ("pmod_add", "ADP-rybosylation"),
    ("pmod_far", "Farn"),
    ("pmod_ger", "Gerger"),
    ("pmod_gly", "Glyco"),
    ("pmod_hyd", "Hy"),
    ("pmod_isg", "ISG"),
    ("pmod_me0", "Me"),
    ("pmod_me1", "Me1"),
    ("pmod_mon", "monomethylation"),
    ("pmod_me2", "Me2"),
    ("pmod_me3", "Me3"),
    ("pmod_tri", "trimethylation"),
    ("pmod_myr", "Myr"),
    ("pmod_ned", "Nedd"),
    ("pmod_ngl", "NGlyco"),
    ("pmod_nit", "NO"),
    ("pmod_ogl", "OGlyco"),
    ("pmod_pal", "Palm"),
    ("pmod_pho", "Ph"),
    ("pmod_sul", "Sulf"),
    ("pmod_sup", "sulphation"),
    ("pmod_suh", "sulfonation"),
    ("pmod_sum", "Sumo"),
    ("pmod_suy", "Ub"),
    ("pmod_ubi", "ubiquitinylation"),
    ("pmod_u48", "UbK48"),
    ("pmod_u63", "UbK63"),
    ("pmod_ubm", "UbMono"),
    ("pmod_ubp", "UbPoly"),
];

/// Abbreviation of a default pmod type; unknown types are returned unchanged.
#[must_use]
pub fn pmod_abbreviation(kind: &str) -> &str {
    PMOD_ABBREVIATIONS
        .iter()
        .find(|(key, _)| *key == kind)
        .map(|(_, short)| *short)
        .unwrap_or(kind)
}

// =============================================================================
// SPECIES
// =============================================================================

/// Namespaces whose identifiers imply a single species.
const SPECIES_NAMESPACES: &[(&str, u32)] = &[
    ("HGNC", 9606),
    ("MGI", 10090),
    ("RGD", 10116),
    ("FLYBASE", 7227),
];

/// Taxonomy id implied by a namespace, if any.
#[must_use]
pub fn species_for_namespace(namespace: &str) -> Option<u32> {
    SPECIES_NAMESPACES
        .iter()
        .find(|(ns, _)| *ns == namespace)
        .map(|(_, taxon)| *taxon)
}
