pub mod rpc;

pub use rpc::{MockSponsorshipRpc, PlatformRpcClient, RpcError, SponsorshipRpc};
