use fvm_ipld_encoding::tuple::*;
use fvm_shared::bigint::{bigint_ser, BigInt};

pub mod storage_market {
    use super::*;

    pub const UPDATE_POWER_METHOD: u64 = 2;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
    pub struct UpdatePowerParams {
        /// Change in this miner's committed power, in sectors.
        #[serde(with = "bigint_ser")]
        pub delta: BigInt,
    }
}
