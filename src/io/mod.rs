//! Checkpoint persistence

mod checkpoint;

pub use checkpoint::{
    load_checkpoint, load_state_dict, save_checkpoint, state_dict, Checkpoint, StateDict,
    BEST_FILE_NAME,
};
