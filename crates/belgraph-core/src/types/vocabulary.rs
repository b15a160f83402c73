//! BEL vocabulary: function classes, statement relations and edge kinds.

use serde::{Deserialize, Serialize};

// =============================================================================
// FUNCTION CLASS
// =============================================================================

/// The kind of a BEL function call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionClass {
    Abundance,
    Activity,
    BiologicalProcess,
    CellSecretion,
    CellSurfaceExpression,
    Complex,
    Composite,
    Degradation,
    Fragment,
    FromLocation,
    Fusion,
    Gene,
    Gmod,
    List,
    Location,
    MicroRna,
    MolecularActivity,
    Pathology,
    Pmod,
    Population,
    Products,
    Protein,
    Reactants,
    Reaction,
    Rna,
    ToLocation,
    Translocation,
    Variant,
}

impl FunctionClass {
    /// Every function class, in declaration order.
    pub const ALL: [Self; 28] = [
        Self::Abundance,
        Self::Activity,
        Self::BiologicalProcess,
        Self::CellSecretion,
        Self::CellSurfaceExpression,
        Self::Complex,
        Self::Composite,
        Self::Degradation,
        Self::Fragment,
        Self::FromLocation,
        Self::Fusion,
        Self::Gene,
        Self::Gmod,
        Self::List,
        Self::Location,
        Self::MicroRna,
        Self::MolecularActivity,
        Self::Pathology,
        Self::Pmod,
        Self::Population,
        Self::Products,
        Self::Protein,
        Self::Reactants,
        Self::Reaction,
        Self::Rna,
        Self::ToLocation,
        Self::Translocation,
        Self::Variant,
    ];

    /// Resolve the function name used in BEL JSON headers.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let class = match name {
            "abundance" => Self::Abundance,
            "activity" => Self::Activity,
            "biological_process" => Self::BiologicalProcess,
            "cell_secretion" => Self::CellSecretion,
            "cell_surface_expression" => Self::CellSurfaceExpression,
            "complex" => Self::Complex,
            "composite" => Self::Composite,
            "degradation" => Self::Degradation,
            "fragment" => Self::Fragment,
            "from_location" => Self::FromLocation,
            "fusion" | "fusion_gene" | "fusion_rna" | "fusion_protein" => Self::Fusion,
            "gene" => Self::Gene,
            "gmod" => Self::Gmod,
            "list" => Self::List,
            "location" => Self::Location,
            "micro_rna" => Self::MicroRna,
            "molecular_activity" => Self::MolecularActivity,
            "pathology" => Self::Pathology,
            "pmod" => Self::Pmod,
            "population" => Self::Population,
            "products" => Self::Products,
            "protein" => Self::Protein,
            "reactants" => Self::Reactants,
            "reaction" => Self::Reaction,
            "rna" => Self::Rna,
            "to_location" => Self::ToLocation,
            "translocation" => Self::Translocation,
            "variant" => Self::Variant,
            _ => return None,
        };
        Some(class)
    }

    /// The snake_case function name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Abundance => "abundance",
            Self::Activity => "activity",
            Self::BiologicalProcess => "biological_process",
            Self::CellSecretion => "cell_secretion",
            Self::CellSurfaceExpression => "cell_surface_expression",
            Self::Complex => "complex",
            Self::Composite => "composite",
            Self::Degradation => "degradation",
            Self::Fragment => "fragment",
            Self::FromLocation => "from_location",
            Self::Fusion => "fusion",
            Self::Gene => "gene",
            Self::Gmod => "gmod",
            Self::List => "list",
            Self::Location => "location",
            Self::MicroRna => "micro_rna",
            Self::MolecularActivity => "molecular_activity",
            Self::Pathology => "pathology",
            Self::Pmod => "pmod",
            Self::Population => "population",
            Self::Products => "products",
            Self::Protein => "protein",
            Self::Reactants => "reactants",
            Self::Reaction => "reaction",
            Self::Rna => "rna",
            Self::ToLocation => "to_location",
            Self::Translocation => "translocation",
            Self::Variant => "variant",
        }
    }

    /// Short BEL function prefix used in canonical strings.
    #[must_use]
    pub const fn short(self) -> &'static str {
        match self {
            Self::Abundance => "a",
            Self::Activity => "act",
            Self::BiologicalProcess => "bp",
            Self::CellSecretion => "sec",
            Self::CellSurfaceExpression => "surf",
            Self::Complex => "complex",
            Self::Composite => "composite",
            Self::Degradation => "deg",
            Self::Fragment => "frag",
            Self::FromLocation => "fromLoc",
            Self::Fusion => "fus",
            Self::Gene => "g",
            Self::Gmod => "gmod",
            Self::List => "list",
            Self::Location => "loc",
            Self::MicroRna => "m",
            Self::MolecularActivity => "ma",
            Self::Pathology => "path",
            Self::Pmod => "pmod",
            Self::Population => "pop",
            Self::Products => "products",
            Self::Protein => "p",
            Self::Reactants => "reactants",
            Self::Reaction => "rxn",
            Self::Rna => "r",
            Self::ToLocation => "toLoc",
            Self::Translocation => "tloc",
            Self::Variant => "var",
        }
    }

    /// Graph label of the class (CamelCase).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Abundance => "Abundance",
            Self::Activity => "Activity",
            Self::BiologicalProcess => "BiologicalProcess",
            Self::CellSecretion => "CellSecretion",
            Self::CellSurfaceExpression => "CellSurfaceExpression",
            Self::Complex => "Complex",
            Self::Composite => "Composite",
            Self::Degradation => "Degradation",
            Self::Fragment => "Fragment",
            Self::FromLocation => "FromLocation",
            Self::Fusion => "Fusion",
            Self::Gene => "Gene",
            Self::Gmod => "Gmod",
            Self::List => "List",
            Self::Location => "Location",
            Self::MicroRna => "MicroRna",
            Self::MolecularActivity => "MolecularActivity",
            Self::Pathology => "Pathology",
            Self::Pmod => "ProteinModification",
            Self::Population => "Population",
            Self::Products => "Products",
            Self::Protein => "Protein",
            Self::Reactants => "Reactants",
            Self::Reaction => "Reaction",
            Self::Rna => "Rna",
            Self::ToLocation => "ToLocation",
            Self::Translocation => "Translocation",
            Self::Variant => "Variant",
        }
    }

    /// Classes that may carry a `pure` flag.
    #[must_use]
    pub const fn is_moleculable(self) -> bool {
        matches!(
            self,
            Self::Protein | Self::Gene | Self::Rna | Self::MicroRna | Self::Abundance | Self::Complex
        )
    }

    /// Modifier sub-terms whose presence makes a node non-pure.
    #[must_use]
    pub const fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::Fragment | Self::Variant | Self::Pmod | Self::Gmod | Self::Location
        )
    }

    /// Classes that are looked up in the backend on every reference
    /// instead of being served from the node cache.
    #[must_use]
    pub const fn always_resolve(self) -> bool {
        matches!(self, Self::Pmod | Self::Fragment | Self::Variant)
    }
}

impl std::fmt::Display for FunctionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// RELATION TYPE
// =============================================================================

/// The relation of a BEL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    AnalogousTo,
    Association,
    BiomarkerFor,
    CausesNoChange,
    Decreases,
    DirectlyDecreases,
    DirectlyIncreases,
    EquivalentTo,
    HasActivity,
    HasComponent,
    HasComponents,
    HasMember,
    HasMembers,
    HasModification,
    Includes,
    Increases,
    IsA,
    NegativeCorrelation,
    Orthologous,
    PositiveCorrelation,
    PrognosticBiomarkerFor,
    RateLimitingStepOf,
    Regulates,
    SubProcessOf,
    TranscribedTo,
    TranslatedTo,
}

impl RelationType {
    /// Resolve a relation name as written in BEL JSON.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let relation = match name {
            "analogous_to" => Self::AnalogousTo,
            "association" => Self::Association,
            "biomarker_for" => Self::BiomarkerFor,
            "causes_no_change" => Self::CausesNoChange,
            "decreases" => Self::Decreases,
            "directly_decreases" => Self::DirectlyDecreases,
            "directly_increases" => Self::DirectlyIncreases,
            "equivalent_to" => Self::EquivalentTo,
            "has_activity" => Self::HasActivity,
            "has_component" => Self::HasComponent,
            "has_components" => Self::HasComponents,
            "has_member" => Self::HasMember,
            "has_members" => Self::HasMembers,
            "has_modification" => Self::HasModification,
            "includes" => Self::Includes,
            "increases" => Self::Increases,
            "is_a" => Self::IsA,
            "negative_correlation" => Self::NegativeCorrelation,
            "orthologous" => Self::Orthologous,
            "positive_correlation" => Self::PositiveCorrelation,
            "prognostic_biomarker_for" => Self::PrognosticBiomarkerFor,
            "rate_limiting_step_of" => Self::RateLimitingStepOf,
            "regulates" => Self::Regulates,
            "sub_process_of" => Self::SubProcessOf,
            "transcribed_to" => Self::TranscribedTo,
            "translated_to" => Self::TranslatedTo,
            _ => return None,
        };
        Some(relation)
    }

    /// The snake_case relation name, also used as the edge label.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AnalogousTo => "analogous_to",
            Self::Association => "association",
            Self::BiomarkerFor => "biomarker_for",
            Self::CausesNoChange => "causes_no_change",
            Self::Decreases => "decreases",
            Self::DirectlyDecreases => "directly_decreases",
            Self::DirectlyIncreases => "directly_increases",
            Self::EquivalentTo => "equivalent_to",
            Self::HasActivity => "has_activity",
            Self::HasComponent => "has_component",
            Self::HasComponents => "has_components",
            Self::HasMember => "has_member",
            Self::HasMembers => "has_members",
            Self::HasModification => "has_modification",
            Self::Includes => "includes",
            Self::Increases => "increases",
            Self::IsA => "is_a",
            Self::NegativeCorrelation => "negative_correlation",
            Self::Orthologous => "orthologous",
            Self::PositiveCorrelation => "positive_correlation",
            Self::PrognosticBiomarkerFor => "prognostic_biomarker_for",
            Self::RateLimitingStepOf => "rate_limiting_step_of",
            Self::Regulates => "regulates",
            Self::SubProcessOf => "sub_process_of",
            Self::TranscribedTo => "transcribed_to",
            Self::TranslatedTo => "translated_to",
        }
    }
}

// =============================================================================
// EDGE KIND
// =============================================================================

/// Link from a pure node to one of its modified forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PureLink {
    /// `has_modified_protein` (pmod)
    ModifiedProtein,
    /// `has_modified_gene` (gmod)
    ModifiedGene,
    /// `has_fragmented_protein` (fragment)
    FragmentedProtein,
    /// `has_variant_<CLASS>` (variant)
    Variant(FunctionClass),
    /// `has_located_<CLASS>` (location)
    Located(FunctionClass),
}

impl PureLink {
    /// The link for a modified node of class `parent` carrying a `modifier` sub-term.
    #[must_use]
    pub const fn for_modifier(modifier: FunctionClass, parent: FunctionClass) -> Option<Self> {
        match modifier {
            FunctionClass::Pmod => Some(Self::ModifiedProtein),
            FunctionClass::Gmod => Some(Self::ModifiedGene),
            FunctionClass::Fragment => Some(Self::FragmentedProtein),
            FunctionClass::Variant => Some(Self::Variant(parent)),
            FunctionClass::Location => Some(Self::Located(parent)),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::ModifiedProtein => "has_modified_protein".to_string(),
            Self::ModifiedGene => "has_modified_gene".to_string(),
            Self::FragmentedProtein => "has_fragmented_protein".to_string(),
            Self::Variant(class) => format!("has_variant_{}", class.label().to_uppercase()),
            Self::Located(class) => format!("has_located_{}", class.label().to_uppercase()),
        }
    }
}

/// The kind of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// `has__<child>` ownership edge from a term to a sub-term.
    Structural(FunctionClass),
    /// Statement relation (or a central-dogma completion edge).
    Relation(RelationType),
    /// Pure node -> modified node.
    PureLink(PureLink),
}

impl EdgeKind {
    /// Edge label as stored in graph databases.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Structural(class) => format!("has__{}", class.name()),
            Self::Relation(relation) => relation.name().to_string(),
            Self::PureLink(link) => link.label(),
        }
    }

    /// `true` for `has__fragment|variant|pmod|gmod|location`.
    #[must_use]
    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Structural(class) if class.is_modifier())
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_for_every_class() {
        for class in FunctionClass::ALL {
            assert_eq!(FunctionClass::from_name(class.name()), Some(class));
        }
    }

    #[test]
    fn fusion_aliases_collapse() {
        assert_eq!(
            FunctionClass::from_name("fusion_protein"),
            Some(FunctionClass::Fusion)
        );
        assert_eq!(FunctionClass::from_name("proteinAbundance"), None);
    }

    #[test]
    fn moleculable_and_modifier_sets_are_disjoint() {
        for class in FunctionClass::ALL {
            assert!(!(class.is_moleculable() && class.is_modifier()), "{class}");
        }
        assert!(FunctionClass::MicroRna.is_moleculable());
        assert!(FunctionClass::Gmod.is_modifier());
        assert!(!FunctionClass::Gmod.always_resolve());
    }

    #[test]
    fn edge_labels() {
        assert_eq!(EdgeKind::Structural(FunctionClass::Pmod).label(), "has__pmod");
        assert_eq!(EdgeKind::Relation(RelationType::TranslatedTo).label(), "translated_to");
        assert_eq!(
            EdgeKind::PureLink(PureLink::Variant(FunctionClass::MicroRna)).label(),
            "has_variant_MICRORNA"
        );
        assert_eq!(
            EdgeKind::PureLink(PureLink::ModifiedProtein).label(),
            "has_modified_protein"
        );
    }

    #[test]
    fn pure_link_only_for_modifiers() {
        assert_eq!(
            PureLink::for_modifier(FunctionClass::Location, FunctionClass::Gene),
            Some(PureLink::Located(FunctionClass::Gene))
        );
        assert_eq!(
            PureLink::for_modifier(FunctionClass::Reactants, FunctionClass::Reaction),
            None
        );
    }

    #[test]
    fn unknown_relation_is_rejected() {
        assert_eq!(RelationType::from_name("increases"), Some(RelationType::Increases));
        assert_eq!(RelationType::from_name("->"), None);
    }
}
