pub use anyhow::{anyhow, bail, Result};
pub use log::{debug, error, info, trace, warn};

pub use crate::config::{self, Config};
pub use crate::coordinator::{Coordinator, PollObserver};
pub use crate::error::{DecodeError, FrameBuildError, PollError, TransportError};
pub use crate::lsw3::{self, frame::Serial};
pub use crate::options::Options;
pub use crate::snapshot::Snapshot;
pub use crate::utils::Utils;
