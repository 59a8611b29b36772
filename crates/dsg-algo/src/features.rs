//! Feature layouts for bus and line/transformer attributes.
//!
//! Node vectors are 32 wide: `node_type` (5), `phase_type` (21), four power
//! aggregates, `num_nodes`, `kv_level`. Edge vectors are 11 wide:
//! `num_phase` (3), `capacity_kva`, `edge_type` (2), `length_miles`, `r0`,
//! `r1`, `x0`, `x1`.

use dsg_core::{DsgResult, EdgeAttrs, EdgeType, NodeAttrs, NodeType, NumPhase, PhaseType};
use once_cell::sync::Lazy;

use crate::codec::{
    CategoricalField, FeatureRecord, FieldSpec, FieldValue, RecordSchema, ValueCursor,
};

macro_rules! categorical {
    ($ty:ty, $values:expr, $label:ident) => {
        impl CategoricalField for $ty {
            const VALUES: &'static [Self] = &$values;

            fn label(&self) -> &'static str {
                self.$label()
            }
        }
    };
}

categorical!(NodeType, NodeType::ALL, as_str);
categorical!(PhaseType, PhaseType::ALL, as_str);
categorical!(NumPhase, NumPhase::ALL, as_str);
categorical!(EdgeType, EdgeType::ALL, as_str);

static NODE_SCHEMA: Lazy<RecordSchema> = Lazy::new(|| {
    RecordSchema::new(
        "node",
        vec![
            FieldSpec::categorical::<NodeType>("node_type"),
            FieldSpec::categorical::<PhaseType>("phase_type"),
            FieldSpec::numeric("active_demand_kw"),
            FieldSpec::numeric("reactive_demand_kw"),
            FieldSpec::numeric("active_generation_kw"),
            FieldSpec::numeric("reactive_generation_kw"),
            FieldSpec::numeric("num_nodes"),
            FieldSpec::numeric("kv_level"),
        ],
    )
});

static EDGE_SCHEMA: Lazy<RecordSchema> = Lazy::new(|| {
    RecordSchema::new(
        "edge",
        vec![
            FieldSpec::categorical::<NumPhase>("num_phase"),
            FieldSpec::numeric("capacity_kva"),
            FieldSpec::categorical::<EdgeType>("edge_type"),
            FieldSpec::numeric("length_miles"),
            FieldSpec::numeric("r0"),
            FieldSpec::numeric("r1"),
            FieldSpec::numeric("x0"),
            FieldSpec::numeric("x1"),
        ],
    )
});

impl FeatureRecord for NodeAttrs {
    fn schema() -> &'static RecordSchema {
        &NODE_SCHEMA
    }

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Category(self.node_type.slot()),
            FieldValue::Category(self.phase_type.slot()),
            FieldValue::Number(self.active_demand_kw),
            FieldValue::Number(self.reactive_demand_kw),
            FieldValue::Number(self.active_generation_kw),
            FieldValue::Number(self.reactive_generation_kw),
            FieldValue::Number(f64::from(self.num_nodes)),
            FieldValue::Number(self.kv_level),
        ]
    }

    fn from_values(values: Vec<FieldValue>) -> DsgResult<Self> {
        let mut cursor = ValueCursor::new(Self::schema(), values)?;
        Ok(NodeAttrs {
            node_type: cursor.category("node_type")?,
            phase_type: cursor.category("phase_type")?,
            active_demand_kw: cursor.number("active_demand_kw")?,
            reactive_demand_kw: cursor.number("reactive_demand_kw")?,
            active_generation_kw: cursor.number("active_generation_kw")?,
            reactive_generation_kw: cursor.number("reactive_generation_kw")?,
            num_nodes: cursor.count("num_nodes")?,
            kv_level: cursor.number("kv_level")?,
        })
    }
}

impl FeatureRecord for EdgeAttrs {
    fn schema() -> &'static RecordSchema {
        &EDGE_SCHEMA
    }

    fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Category(self.num_phase.slot()),
            FieldValue::Number(self.capacity_kva),
            FieldValue::Category(self.edge_type.slot()),
            FieldValue::Number(self.length_miles),
            FieldValue::Number(self.r0),
            FieldValue::Number(self.r1),
            FieldValue::Number(self.x0),
            FieldValue::Number(self.x1),
        ]
    }

    fn from_values(values: Vec<FieldValue>) -> DsgResult<Self> {
        let mut cursor = ValueCursor::new(Self::schema(), values)?;
        Ok(EdgeAttrs {
            num_phase: cursor.category("num_phase")?,
            capacity_kva: cursor.number("capacity_kva")?,
            edge_type: cursor.category("edge_type")?,
            length_miles: cursor.number("length_miles")?,
            r0: cursor.number("r0")?,
            r1: cursor.number("r1")?,
            x0: cursor.number("x0")?,
            x1: cursor.number("x1")?,
        })
    }
}
