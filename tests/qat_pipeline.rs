//! End-to-end tests for the QAT pipeline: rewrite a small pretrained
//! network, reconfigure its precision, fine-tune, and checkpoint.

use cuantizar::autograd::Conv2dShape;
use cuantizar::io::{load_state_dict, state_dict};
use cuantizar::nn::{Container, Conv2d, Layer, LayerKind, Linear, Network, ReLU};
use cuantizar::optim::{CosineAnnealingLR, LRScheduler, Optimizer, SGD};
use cuantizar::quant::QReLU;
use cuantizar::rewrite::{rewrite, set_bit_width, Registry};
use cuantizar::train::{train_epoch, validate, Batch, CrossEntropyLoss, TrainConfig};
use cuantizar::Tensor;

fn conv_shape() -> Conv2dShape {
    Conv2dShape {
        in_channels: 1,
        out_channels: 2,
        kernel: 3,
        stride: 1,
        padding: 0,
        in_h: 6,
        in_w: 6,
    }
}

/// A LeNet-flavored toy classifier: conv → relu → linear over 6x6 inputs
fn lenet() -> Network {
    let shape = conv_shape();
    // 2 channels of 4x4 feature maps
    let flat = shape.out_channels * shape.out_h() * shape.out_w();

    let mut features = Container::new();
    features.add("conv", Layer::Conv2d(Conv2d::new(shape, true)));
    features.add("act", Layer::ReLU(ReLU::new()));

    let mut root = Container::new();
    root.add("features", Layer::Container(features));
    root.add("classifier", Layer::Linear(Linear::new(flat, 3, true)));
    Network::new(Layer::Container(root))
}

fn quantize(net: Network, bits: u32) -> Network {
    let net = rewrite(net, &Registry::weight_layers()).unwrap();
    let mut net = rewrite(net, &Registry::activations()).unwrap();
    set_bit_width(&mut net, bits).unwrap();
    net
}

fn toy_batches() -> Vec<Batch> {
    // Three fixed patterns, one per class
    let patterns: [fn(usize) -> f32; 3] = [
        |i| if i % 2 == 0 { 1.0 } else { 0.0 },
        |i| (i as f32 / 36.0),
        |i| if i < 18 { 1.0 } else { -1.0 },
    ];

    patterns
        .iter()
        .enumerate()
        .map(|(class, pattern)| {
            let inputs: Vec<f32> = (0..36).map(|i| pattern(i)).collect();
            let mut targets = vec![0.0; 3];
            targets[class] = 1.0;
            Batch::new(Tensor::from_vec(inputs, false), Tensor::from_vec(targets, false))
        })
        .collect()
}

fn kind_at(net: &Network, path: &[&str]) -> LayerKind {
    let mut layer = net.root();
    for name in path {
        layer = layer.as_container().unwrap().child(name).unwrap();
    }
    layer.kind()
}

#[test]
fn two_pass_rewrite_converts_all_compute_layers() {
    let net = rewrite(lenet(), &Registry::weight_layers()).unwrap();
    let net = rewrite(net, &Registry::activations()).unwrap();

    assert_eq!(kind_at(&net, &["features", "conv"]), LayerKind::QConv2d);
    assert_eq!(kind_at(&net, &["features", "act"]), LayerKind::QReLU);
    assert_eq!(kind_at(&net, &["classifier"]), LayerKind::QLinear);
}

#[test]
fn rewrite_preserves_topology_and_node_count() {
    let original = lenet();
    let topo = original.topology();
    let nodes = original.num_nodes();

    let net = quantize(original, 4);

    assert_eq!(net.topology(), topo);
    assert_eq!(net.num_nodes(), nodes);
}

#[test]
fn rewritten_network_is_exact_until_bits_are_set() {
    let original = lenet();
    let x = Tensor::from_vec((0..36).map(|i| (i as f32 - 18.0) / 10.0).collect(), false);
    let expected = original.forward(&x);

    let net = rewrite(original, &Registry::weight_layers()).unwrap();
    let net = rewrite(net, &Registry::activations()).unwrap();
    let converted = net.forward(&x);

    assert_eq!(converted.data().to_vec(), expected.data().to_vec());
}

#[test]
fn quantized_forward_differs_from_full_precision() {
    let original = lenet();
    let x = Tensor::from_vec((0..36).map(|i| (i as f32 - 18.0) / 10.0).collect(), false);
    let full = original.forward(&x);

    let net = quantize(original, 2);
    let quant = net.forward(&x);

    assert_ne!(quant.data().to_vec(), full.data().to_vec());
}

#[test]
fn bit_width_pass_is_idempotent() {
    let mut net = quantize(lenet(), 4);
    let x = Tensor::from_vec(vec![0.3; 36], false);
    let once = net.forward(&x);

    set_bit_width(&mut net, 4).unwrap();
    let twice = net.forward(&x);

    assert_eq!(once.data().to_vec(), twice.data().to_vec());
}

#[test]
fn registration_precedence_is_last_write_wins() {
    let mut registry = Registry::weight_layers();
    // Override the linear conversion with a pass-through
    registry.register(LayerKind::Linear, Ok);

    let net = rewrite(lenet(), &registry).unwrap();
    assert_eq!(kind_at(&net, &["classifier"]), LayerKind::Linear);
    assert_eq!(kind_at(&net, &["features", "conv"]), LayerKind::QConv2d);
}

#[test]
fn qat_training_smoke_test() {
    let mut net = quantize(lenet(), 8);
    let data = toy_batches();
    let loss_fn = CrossEntropyLoss;

    let config = TrainConfig { epochs: 40, lr: 0.05, ..TrainConfig::default() };
    config.validate().unwrap();

    let mut opt = SGD::new(config.lr, config.momentum, config.weight_decay);
    let mut sched = CosineAnnealingLR::default_min(config.lr, config.epochs);

    let before = validate(&net, &data, &loss_fn);
    for _ in 0..config.epochs {
        sched.apply(&mut opt);
        train_epoch(&mut net, &data, &loss_fn, &mut opt);
        sched.step();
    }
    let after = validate(&net, &data, &loss_fn);

    assert!(
        after.loss < before.loss,
        "fine-tuning should reduce loss: {} -> {}",
        before.loss,
        after.loss
    );
    assert!(opt.lr() < config.lr);
}

#[test]
fn clip_threshold_trains_when_activations_exceed_it() {
    let mut act = QReLU::with_threshold(1.0);
    act.quant_mut().set_bits(4).unwrap();

    let mut root = Container::new();
    root.add("act", Layer::QReLU(act));
    root.add("head", Layer::Linear(Linear::new(2, 2, false)));
    let mut net = Network::new(Layer::Container(root));

    // Inputs well above the threshold keep the clip gradient nonzero
    let data = vec![Batch::new(
        Tensor::from_vec(vec![5.0, 4.0], false),
        Tensor::from_vec(vec![1.0, 0.0], false),
    )];

    let mut opt = SGD::new(0.1, 0.0, 0.0);
    for _ in 0..3 {
        train_epoch(&mut net, &data, &CrossEntropyLoss, &mut opt);
    }

    let threshold = match net.root().as_container().unwrap().child("act").unwrap() {
        Layer::QReLU(l) => l.clip_threshold().data()[0],
        _ => unreachable!(),
    };
    assert_ne!(threshold, 1.0, "clip threshold should move during training");
}

#[test]
fn checkpoint_round_trip_restores_quantized_network() {
    let mut net = quantize(lenet(), 4);

    // A little training so the snapshot is not the init state
    let data = toy_batches();
    let mut opt = SGD::new(0.05, 0.9, 4e-5);
    for _ in 0..3 {
        train_epoch(&mut net, &data, &CrossEntropyLoss, &mut opt);
    }

    let dict = state_dict(&net);
    let checkpoint = cuantizar::io::Checkpoint { epoch: 3, best_top1: 0.5, state: dict };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkpoint.json");
    cuantizar::io::save_checkpoint(&checkpoint, &path, true).unwrap();
    let loaded = cuantizar::io::load_checkpoint(&path).unwrap();

    let mut restored = quantize(lenet(), 4);
    load_state_dict(&mut restored, &loaded.state).unwrap();

    let x = Tensor::from_vec(vec![0.25; 36], false);
    assert_eq!(
        restored.forward(&x).data().to_vec(),
        net.forward(&x).data().to_vec(),
        "restored network must reproduce the checkpointed forward pass"
    );
}

#[test]
fn full_precision_checkpoint_loads_into_quantized_network() {
    let pretrained = lenet();
    let mut converted = rewrite(pretrained.clone(), &Registry::weight_layers()).unwrap();
    let full_dict = {
        // Plain and converted networks share tensor paths for weights
        let converted_for_paths = state_dict(&converted);
        let plain = state_dict(&pretrained);
        assert_eq!(
            plain.tensors.keys().collect::<Vec<_>>(),
            converted_for_paths.tensors.keys().collect::<Vec<_>>()
        );
        plain
    };

    load_state_dict(&mut converted, &full_dict).unwrap();
    set_bit_width(&mut converted, 4).unwrap();

    let x = Tensor::from_vec(vec![0.5; 36], false);
    let y = converted.forward(&x);
    assert!(y.data().iter().all(|v| v.is_finite()));
}
