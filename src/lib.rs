#[macro_export]
macro_rules! lock {
    ($x: expr) => {{
        match $x.lock() {
            Ok(v) => v,
            Err(_) => {
                panic!("SIGNALMAN POISONED LOCK {}/{}/{}",file!(),line!(),column!());
            }
        }
    }}
}

pub mod console;
pub mod error;

pub mod cps {
    pub mod continuation;
}

pub mod corefutures {
    pub mod promise;
}

pub mod derivedfutures {
    pub mod channel;
    pub mod stream;
}

pub mod lane {
    pub mod group;
    pub mod lane;
    pub mod pool;
    pub mod semaphore;
}

pub mod sync {
    pub mod lock;
}

pub use crate::cps::continuation::{ Consumer, Continuation };
pub use crate::corefutures::promise::{ Future, Promise };
pub use crate::derivedfutures::channel::{ Channel, ChannelWriter };
pub use crate::derivedfutures::stream::{ Stream, StreamHandler };
pub use crate::error::WaitTimeout;
pub use crate::lane::group::TaskGroup;
pub use crate::lane::lane::Lane;
pub use crate::lane::pool::{ LaneSummary, PoolConfig };
pub use crate::lane::semaphore::{ parallel_for, Semaphore };
pub use crate::sync::lock::Lock;
