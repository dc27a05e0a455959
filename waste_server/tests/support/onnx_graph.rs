//! Small ONNX checkpoints shaped like the waste classifier.
//!
use prost::Message;
use tract_onnx::pb::{
    tensor_proto::DataType, type_proto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto,
    TensorProto, TypeProto, ValueInfoProto,
};

/// Weight of the linear head for each of the three input channels.
pub const HEAD_WEIGHTS: [f32; 3] = [0.4, -0.3, 0.2];

/// Encode `input -> GlobalAveragePool -> Flatten -> MatMul -> Sigmoid`.
///
/// The head maps the three pooled channels onto `outputs` values, each using `HEAD_WEIGHTS`.
pub fn pooled_sigmoid_head(outputs: usize) -> Vec<u8> {
    let weights: Vec<f32> = HEAD_WEIGHTS
        .iter()
        .flat_map(|w| std::iter::repeat(*w).take(outputs))
        .collect();

    let graph = GraphProto {
        name: "waste_head".into(),
        node: vec![
            node("GlobalAveragePool", &["input"], "pooled"),
            node("Flatten", &["pooled"], "features"),
            node("MatMul", &["features", "classifier.1.0.weight"], "logits"),
            node("Sigmoid", &["logits"], "output"),
        ],
        initializer: vec![TensorProto {
            name: "classifier.1.0.weight".into(),
            dims: vec![3, outputs as i64],
            data_type: DataType::Float as i32,
            float_data: weights,
            ..Default::default()
        }],
        input: vec![float_value("input")],
        output: vec![float_value("output")],
        ..Default::default()
    };

    ModelProto {
        ir_version: 7,
        opset_import: vec![OperatorSetIdProto {
            version: 13,
            ..Default::default()
        }],
        graph: Some(graph),
        ..Default::default()
    }
    .encode_to_vec()
}

fn node(op_type: &str, inputs: &[&str], output: &str) -> NodeProto {
    NodeProto {
        input: inputs.iter().map(|name| name.to_string()).collect(),
        output: vec![output.to_owned()],
        name: output.to_owned(),
        op_type: op_type.to_owned(),
        ..Default::default()
    }
}

fn float_value(name: &str) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_owned(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: DataType::Float as i32,
                shape: None,
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}
