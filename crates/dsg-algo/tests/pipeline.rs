use dsg_algo::{process_topology, PartitionStrategy, PipelineConfig, SubgraphTensors};
use dsg_core::{DsgError, TopologyRecords};

const FEEDER: &str = r#"{
    "source_bus": "sub",
    "buses": [
        {"id": "sub", "kv_level": 69.0, "phase_configuration": "ABC", "node_count": 3},
        {"id": "n1", "kv_level": 12.47, "phase_configuration": "ABCN", "node_count": 4},
        {"id": "n2", "kv_level": 12.47, "phase_configuration": "CA", "node_count": 2},
        {"id": "t1", "kv_level": 0.24, "phase_configuration": "S1S2"},
        {"id": "t2", "kv_level": 0.24, "phase_configuration": "S1S2N"},
        {"id": "m1", "kv_level": 0.24, "phase_configuration": "S1S2"}
    ],
    "edges": [
        {"endpoint_a": "sub", "endpoint_b": "n1", "kind": "transformer", "num_phase": 3, "capacity_kva": 10000},
        {"endpoint_a": "n1", "endpoint_b": "n2", "kind": "line", "num_phase": 2, "capacity_kva": 400,
         "length_miles": 0.8, "r0": 0.4, "r1": 0.2, "x0": 1.1, "x1": 0.5},
        {"endpoint_a": "n2", "endpoint_b": "t1", "kind": "transformer", "num_phase": 1, "capacity_kva": 25},
        {"endpoint_a": "t2", "endpoint_b": "n2", "kind": "transformer", "num_phase": 1, "capacity_kva": 50},
        {"endpoint_a": "t1", "endpoint_b": "m1", "kind": "conductor", "num_phase": 1, "capacity_kva": 30,
         "length_miles": 0.01}
    ],
    "injections": [
        {"bus": "m1", "kind": "load", "kw": 3.5, "kvar": 1.0},
        {"bus": "t2", "kind": "generation", "kw": 7.0},
        {"bus": "t2", "kind": "load", "kw": 1.0},
        {"bus": "n1", "kind": "capacitor", "kvar": 300},
        {"bus": "nowhere", "kind": "load", "kw": 1.0}
    ]
}"#;

fn records() -> TopologyRecords {
    serde_json::from_str(FEEDER).unwrap()
}

#[test]
fn transformer_partition_from_json_records() {
    let output = process_topology(&records(), &PipelineConfig::default()).unwrap();
    assert_eq!(output.num_buses, 6);
    assert_eq!(output.num_transformers, 3);
    assert_eq!(output.dropped_buses, 0);
    assert_eq!(output.diagnostics.len(), 1);

    // candidates: sub (3 transformers below), n2 twice (2 below)
    assert!(output.subgraphs.is_empty());
}

#[test]
fn node_partition_tensors_are_consistent() {
    let config = PipelineConfig {
        partition: PartitionStrategy::Node {
            min_transformers: 1,
            max_transformers: 2,
        },
    };
    let output = process_topology(&records(), &config).unwrap();
    let roots: Vec<&str> = output.subgraphs.iter().map(|s| s.root.as_str()).collect();
    assert_eq!(roots, ["n1", "n2"]);

    for sub in &output.subgraphs {
        sub.tensors.validate().unwrap();
        let pyg = sub.tensors.to_pytorch_geometric_json();
        let back = SubgraphTensors::from_pytorch_geometric_json(&pyg).unwrap();
        assert_eq!(back, sub.tensors);

        let nodes = sub.tensors.node_attrs().unwrap();
        assert_eq!(nodes[0].node_type, dsg_core::NodeType::Source);
    }

    let n2 = &output.subgraphs[1].tensors;
    assert_eq!(n2.node_names, ["n2", "t1", "m1", "t2"]);
    assert_eq!(n2.edge_index.0, [0, 1, 0]);
    assert_eq!(n2.edge_index.1, [1, 2, 3]);
    let t2 = &n2.node_attrs().unwrap()[3];
    assert_eq!(t2.node_type, dsg_core::NodeType::LoadAndGeneration);
}

#[test]
fn unknown_phase_rejects_the_topology() {
    let mut records = records();
    records.buses[2].phase_configuration = "XYZ".into();
    assert_eq!(
        process_topology(&records, &PipelineConfig::default()).unwrap_err(),
        DsgError::UnknownPhase("XYZ".into())
    );
}
