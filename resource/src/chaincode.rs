//! Install chaincode and query peers through their system chaincodes.
//!
//! Peers expose their local state through two system chaincodes: `cscc` (configuration: joined
//! channels, joining new ones) and `lscc` (lifecycle: installed and instantiated chaincode).
//! Each query here is a proposal invoking one of their functions, whose response payload is
//! decoded into the matching wire message.

use crate::{
    encode,
    error::Stage,
    txn::{
        create_chaincode_invoke_proposal, process, send_proposal, sign_proposal,
        validate_response, ChaincodeInvokeRequest, TransactionHeader, TransactionId,
        TransactionProposal, TransactionProposalResponse,
    },
    Client, Dispatch, Error, ProposalProcessor, Request,
};
use bytes::Bytes;
use commonware_runtime::Clock;
use fabric_wire::peer::{
    chaincode_spec, ChaincodeDeploymentSpec, ChaincodeId, ChaincodeQueryResponse, ChaincodeSpec,
    ChannelQueryResponse,
};
use prost::Message;
use rand::{CryptoRng, RngCore};
use tracing::{debug, warn};

/// Name of the configuration system chaincode.
pub const CSCC: &str = "cscc";

/// Name of the lifecycle system chaincode.
pub const LSCC: &str = "lscc";

/// The source package of a chaincode.
#[derive(Clone, Debug)]
pub struct ChaincodePackage {
    /// Language the chaincode is written in.
    pub kind: chaincode_spec::Type,

    /// Packaged source code.
    pub code: Bytes,
}

/// A request to install chaincode on peers.
#[derive(Clone, Debug, Default)]
pub struct InstallChaincodeRequest {
    pub name: String,
    pub path: String,
    pub version: String,
    pub package: Option<ChaincodePackage>,
}

/// Invokes `invoke` on each of `targets` in order, returning the payload of every successful
/// invocation.
///
/// Responses are index-aligned with `targets`: a target that failed (at any stage, including a
/// non-success status) leaves an empty payload at its position and an entry in
/// [Dispatch::errors]. Later targets are attempted regardless.
pub async fn query_chaincode<E, P>(
    request: &Request<E>,
    client: &Client,
    invoke: &ChaincodeInvokeRequest,
    targets: &[P],
) -> Dispatch<Bytes>
where
    E: Clock + RngCore + CryptoRng,
    P: ProposalProcessor,
{
    let mut dispatch = Dispatch::default();
    for (index, target) in targets.iter().enumerate() {
        match query_chaincode_with_target(request, client, invoke, target).await {
            Ok(payload) => dispatch.responses.push(payload),
            Err(err) => {
                warn!(
                    chaincode = %invoke.chaincode_id,
                    fcn = %invoke.fcn,
                    target = target.endpoint(),
                    ?err,
                    "query failed"
                );
                dispatch.responses.push(Bytes::new());
                dispatch.errors.push(index, target.endpoint(), err);
            }
        }
    }
    dispatch
}

/// Invokes `invoke` on a single peer (on the system channel) and returns the chaincode's
/// response payload.
///
/// Each call binds a fresh transaction header, so repeated queries never share a transaction ID.
pub async fn query_chaincode_with_target<E, P>(
    request: &Request<E>,
    client: &Client,
    invoke: &ChaincodeInvokeRequest,
    target: &P,
) -> Result<Bytes, Error>
where
    E: Clock + RngCore + CryptoRng,
    P: ProposalProcessor,
{
    query_on_channel(request, client, &client.config().system_channel, invoke, target).await
}

async fn query_on_channel<E, P>(
    request: &Request<E>,
    client: &Client,
    channel: &str,
    invoke: &ChaincodeInvokeRequest,
    target: &P,
) -> Result<Bytes, Error>
where
    E: Clock + RngCore + CryptoRng,
    P: ProposalProcessor,
{
    let header = TransactionHeader::new(&mut request.context().clone(), client, channel)
        .stage("create transaction header")?;
    let proposal =
        create_chaincode_invoke_proposal(&header, client.config().tls_cert_hash(), invoke)
            .stage("create proposal")?;
    let signed = sign_proposal(client.identity()?, &proposal.proposal).stage("sign proposal")?;
    let response = process(request, &signed, target)
        .await
        .stage("send proposal")?;
    validate_response(&response).stage("transaction proposal failed")?;
    debug!(
        chaincode = %invoke.chaincode_id,
        fcn = %invoke.fcn,
        target = target.endpoint(),
        txn = %proposal.txn_id,
        "query succeeded"
    );
    Ok(response.payload())
}

/// Lists the channels `peer` has joined.
pub async fn query_channels<E, P>(
    request: &Request<E>,
    client: &Client,
    peer: Option<&P>,
) -> Result<ChannelQueryResponse, Error>
where
    E: Clock + RngCore + CryptoRng,
    P: ProposalProcessor,
{
    let peer = peer.ok_or(Error::Missing("peer"))?;
    let invoke = ChaincodeInvokeRequest::new(CSCC, "GetChannels");
    let payload = query_chaincode_with_target(request, client, &invoke, peer).await?;
    ChannelQueryResponse::decode(payload)
        .map_err(|err| Error::Decode("channel query response", err))
}

/// Lists the chaincode installed on `peer`.
pub async fn query_installed_chaincodes<E, P>(
    request: &Request<E>,
    client: &Client,
    peer: Option<&P>,
) -> Result<ChaincodeQueryResponse, Error>
where
    E: Clock + RngCore + CryptoRng,
    P: ProposalProcessor,
{
    let peer = peer.ok_or(Error::Missing("peer"))?;
    let invoke = ChaincodeInvokeRequest::new(LSCC, "getinstalledchaincodes");
    let payload = query_chaincode_with_target(request, client, &invoke, peer).await?;
    ChaincodeQueryResponse::decode(payload)
        .map_err(|err| Error::Decode("chaincode query response", err))
}

/// Lists the chaincode instantiated on `channel`, as seen by `peer`.
pub async fn query_instantiated_chaincodes<E, P>(
    request: &Request<E>,
    client: &Client,
    channel: &str,
    peer: Option<&P>,
) -> Result<ChaincodeQueryResponse, Error>
where
    E: Clock + RngCore + CryptoRng,
    P: ProposalProcessor,
{
    let peer = peer.ok_or(Error::Missing("peer"))?;
    if channel.is_empty() {
        return Err(Error::Missing("channel name"));
    }
    let invoke = ChaincodeInvokeRequest::new(LSCC, "getchaincodes");
    let payload = query_on_channel(request, client, channel, &invoke, peer).await?;
    ChaincodeQueryResponse::decode(payload)
        .map_err(|err| Error::Decode("chaincode query response", err))
}

/// Builds the proposal that installs the chaincode described by `install`.
pub fn create_chaincode_install_proposal(
    header: &TransactionHeader,
    tls_cert_hash: Option<Bytes>,
    install: &InstallChaincodeRequest,
) -> Result<TransactionProposal, Error> {
    let package = install
        .package
        .as_ref()
        .ok_or(Error::Missing("chaincode package"))?;
    let deployment = ChaincodeDeploymentSpec {
        chaincode_spec: Some(ChaincodeSpec {
            r#type: package.kind as i32,
            chaincode_id: Some(ChaincodeId {
                path: install.path.clone(),
                name: install.name.clone(),
                version: install.version.clone(),
            }),
            ..Default::default()
        }),
        code_package: package.code.clone(),
        ..Default::default()
    };
    let invoke = ChaincodeInvokeRequest::new(LSCC, "install").with_arg(encode(&deployment));
    create_chaincode_invoke_proposal(header, tls_cert_hash, &invoke)
}

/// Installs chaincode on each of `targets`.
///
/// Fields are validated in order (name, path, version, package) before anything is built or
/// sent. Every target is attempted; per-target failures are reported in [Dispatch::errors].
pub async fn install_chaincode<E, P>(
    request: &Request<E>,
    client: &Client,
    install: &InstallChaincodeRequest,
    targets: &[P],
) -> Result<(TransactionId, Dispatch<TransactionProposalResponse>), Error>
where
    E: Clock + RngCore + CryptoRng,
    P: ProposalProcessor,
{
    if install.name.is_empty() {
        return Err(Error::Missing("chaincode name"));
    }
    if install.path.is_empty() {
        return Err(Error::Missing("chaincode path"));
    }
    if install.version.is_empty() {
        return Err(Error::Missing("chaincode version"));
    }
    if install.package.is_none() {
        return Err(Error::Missing("chaincode package"));
    }

    let header = TransactionHeader::new(
        &mut request.context().clone(),
        client,
        &client.config().system_channel,
    )
    .stage("create transaction header")?;
    let proposal =
        create_chaincode_install_proposal(&header, client.config().tls_cert_hash(), install)
            .stage("create install proposal")?;
    let dispatch = send_proposal(request, client, &proposal, targets).await?;
    debug!(
        chaincode = %install.name,
        version = %install.version,
        txn = %proposal.txn_id,
        endorsed = dispatch.responses.len(),
        failed = dispatch.errors.len(),
        "install completed"
    );
    Ok((proposal.txn_id, dispatch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mocks::{self, Peer},
        Config, SUCCESS,
    };
    use commonware_macros::test_traced;
    use commonware_runtime::{deterministic, Runner};
    use fabric_wire::peer::{ChaincodeInfo, ChannelInfo};

    fn channels() -> ChannelQueryResponse {
        ChannelQueryResponse {
            channels: vec![
                ChannelInfo {
                    channel_id: "alpha".into(),
                },
                ChannelInfo {
                    channel_id: "beta".into(),
                },
            ],
        }
    }

    fn chaincodes() -> ChaincodeQueryResponse {
        ChaincodeQueryResponse {
            chaincodes: vec![ChaincodeInfo {
                name: "mycc".into(),
                version: "1.0".into(),
                path: "github.com/example/mycc".into(),
                ..Default::default()
            }],
        }
    }

    fn install_request() -> InstallChaincodeRequest {
        InstallChaincodeRequest {
            name: "mycc".into(),
            path: "github.com/example/mycc".into(),
            version: "1.0".into(),
            package: Some(ChaincodePackage {
                kind: chaincode_spec::Type::Golang,
                code: Bytes::from_static(b"tarball"),
            }),
        }
    }

    #[test_traced]
    fn test_query_chaincode_index_aligned() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let request = Request::new(context);
            let targets = vec![
                Peer::responding("peer0:7051", Bytes::from_static(b"a")),
                Peer::failing("peer1:7051", "connection refused"),
                Peer::rejecting("peer2:7051", 500, "bad request"),
                Peer::responding("peer3:7051", Bytes::from_static(b"d")),
            ];
            let invoke = ChaincodeInvokeRequest::new("mycc", "query").with_arg("key");
            let dispatch = query_chaincode(&request, &client, &invoke, &targets).await;

            assert_eq!(
                dispatch.responses,
                vec![
                    Bytes::from_static(b"a"),
                    Bytes::new(),
                    Bytes::new(),
                    Bytes::from_static(b"d"),
                ]
            );
            assert_eq!(dispatch.errors.len(), 2);
            assert!(matches!(
                dispatch.errors.get(1).map(Error::root),
                Some(Error::Transport(_))
            ));
            assert!(matches!(
                dispatch.errors.get(2).map(Error::root),
                Some(Error::Endorsement { status: 500, .. })
            ));
            for target in &targets {
                assert_eq!(target.received().len(), 1);
            }
        });
    }

    #[test_traced]
    fn test_query_chaincode_fresh_transaction_per_target() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let request = Request::new(context);
            let targets = vec![
                Peer::responding("peer0:7051", Bytes::new()),
                Peer::responding("peer1:7051", Bytes::new()),
            ];
            let invoke = ChaincodeInvokeRequest::new("mycc", "query");
            let dispatch = query_chaincode(&request, &client, &invoke, &targets).await;
            assert!(dispatch.errors.is_empty());
            assert_ne!(targets[0].received(), targets[1].received());
        });
    }

    #[test_traced]
    fn test_query_chaincode_cancelled() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let (request, canceller) = Request::new(context).cancellable();
            let targets = vec![
                Peer::responding("peer0:7051", Bytes::from_static(b"a")),
                Peer::cancelling("peer1:7051", canceller),
                Peer::responding("peer2:7051", Bytes::from_static(b"c")),
            ];
            let invoke = ChaincodeInvokeRequest::new("mycc", "query");
            let dispatch = query_chaincode(&request, &client, &invoke, &targets).await;

            // Every target is accounted for, and none after the cancellation is contacted
            assert_eq!(dispatch.responses.len(), 3);
            assert_eq!(dispatch.responses[0], Bytes::from_static(b"a"));
            assert_eq!(dispatch.errors.len(), 2);
            assert!(dispatch.errors.get(1).unwrap().is_cancellation());
            assert!(dispatch.errors.get(2).unwrap().is_cancellation());
            assert!(targets[2].received().is_empty());
        });
    }

    #[test_traced]
    fn test_query_channels() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let request = Request::new(context);
            let peer = Peer::responding("peer0:7051", encode(&channels()));
            let response = query_channels(&request, &client, Some(&peer)).await.unwrap();
            assert_eq!(response, channels());

            let received = peer.received();
            assert_eq!(received.len(), 1);
            let (channel, spec) = mocks::invocation(&received[0]);
            assert_eq!(channel, "");
            assert_eq!(spec.chaincode_id.unwrap().name, CSCC);
            assert_eq!(
                spec.input.unwrap().args,
                vec![Bytes::from_static(b"GetChannels")]
            );
        });
    }

    #[test_traced]
    fn test_query_channels_requires_peer() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let request = Request::new(context);
            let result = query_channels::<_, Peer>(&request, &client, None).await;
            assert!(matches!(result, Err(Error::Missing("peer"))));
        });
    }

    #[test_traced]
    fn test_query_channels_undecodable_payload() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let request = Request::new(context);
            let peer = Peer::responding("peer0:7051", Bytes::from_static(&[0xff]));
            let result = query_channels(&request, &client, Some(&peer)).await;
            assert!(matches!(result, Err(Error::Decode("channel query response", _))));
        });
    }

    #[test_traced]
    fn test_query_installed_chaincodes() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let request = Request::new(context);
            let peer = Peer::responding("peer0:7051", encode(&chaincodes()));
            let response = query_installed_chaincodes(&request, &client, Some(&peer))
                .await
                .unwrap();
            assert_eq!(response, chaincodes());

            let (_, spec) = mocks::invocation(&peer.received()[0]);
            assert_eq!(spec.chaincode_id.unwrap().name, LSCC);
            assert_eq!(
                spec.input.unwrap().args,
                vec![Bytes::from_static(b"getinstalledchaincodes")]
            );

            let result = query_installed_chaincodes::<_, Peer>(&request, &client, None).await;
            assert!(matches!(result, Err(Error::Missing("peer"))));
        });
    }

    #[test_traced]
    fn test_query_instantiated_chaincodes() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let request = Request::new(context);
            let peer = Peer::responding("peer0:7051", encode(&chaincodes()));
            let response =
                query_instantiated_chaincodes(&request, &client, "mychannel", Some(&peer))
                    .await
                    .unwrap();
            assert_eq!(response, chaincodes());

            let (channel, spec) = mocks::invocation(&peer.received()[0]);
            assert_eq!(channel, "mychannel");
            assert_eq!(
                spec.input.unwrap().args,
                vec![Bytes::from_static(b"getchaincodes")]
            );
        });
    }

    #[test_traced]
    fn test_query_uses_system_channel() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let config = Config {
                system_channel: "syschannel".into(),
                ..Default::default()
            };
            let client = Client::new(config, mocks::signing_identity("Org1MSP"));
            let request = Request::new(context);
            let peer = Peer::responding("peer0:7051", encode(&channels()));
            query_channels(&request, &client, Some(&peer)).await.unwrap();

            let (channel, _) = mocks::invocation(&peer.received()[0]);
            assert_eq!(channel, "syschannel");
        });
    }

    #[test_traced]
    fn test_query_rejected_status() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let request = Request::new(context);
            let peer = Peer::rejecting("peer0:7051", 403, "access denied");
            let Err(err) = query_channels(&request, &client, Some(&peer)).await else {
                panic!("expected rejection");
            };
            assert!(err.to_string().contains("transaction proposal failed"));
            let Error::Endorsement {
                endorser,
                status,
                message,
            } = err.root()
            else {
                panic!("unexpected error: {err}");
            };
            assert_eq!(endorser, "peer0:7051");
            assert_eq!(*status, 403);
            assert_eq!(message, "access denied");
        });
    }

    #[test_traced]
    fn test_install_chaincode() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let request = Request::new(context);
            let targets = vec![
                Peer::responding("peer0:7051", Bytes::new()),
                Peer::failing("peer1:7051", "connection reset"),
            ];
            let (txn_id, dispatch) =
                install_chaincode(&request, &client, &install_request(), &targets)
                    .await
                    .unwrap();
            assert!(!txn_id.is_empty());
            assert_eq!(dispatch.responses.len(), 1);
            assert_eq!(dispatch.responses[0].status, SUCCESS);
            assert_eq!(dispatch.errors.len(), 1);
            assert!(dispatch.errors.get(1).is_some());

            let (_, spec) = mocks::invocation(&targets[0].received()[0]);
            assert_eq!(spec.chaincode_id.unwrap().name, LSCC);
            let args = spec.input.unwrap().args;
            assert_eq!(args[0], Bytes::from_static(b"install"));
            let deployment = ChaincodeDeploymentSpec::decode(args[1].clone()).unwrap();
            assert_eq!(deployment.code_package, Bytes::from_static(b"tarball"));
            let spec = deployment.chaincode_spec.unwrap();
            assert_eq!(spec.r#type(), chaincode_spec::Type::Golang);
            let id = spec.chaincode_id.unwrap();
            assert_eq!(id.name, "mycc");
            assert_eq!(id.path, "github.com/example/mycc");
            assert_eq!(id.version, "1.0");
        });
    }

    #[test_traced]
    fn test_install_chaincode_surfaces_failed_targets() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let request = Request::new(context);
            let targets = vec![
                Peer::responding("peer0:7051", Bytes::new()),
                Peer::failing("peer1:7051", "connection reset"),
            ];
            let (_, dispatch) = install_chaincode(&request, &client, &install_request(), &targets)
                .await
                .unwrap();
            let Err(Error::Aggregate(errors)) = dispatch.into_result() else {
                panic!("expected failed target to be reported");
            };
            let failure = errors.iter().next().unwrap();
            assert_eq!(failure.index, 1);
            assert_eq!(failure.target, "peer1:7051");
        });
    }

    #[test_traced]
    fn test_install_chaincode_validation() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let request = Request::new(context);
            let targets = vec![Peer::responding("peer0:7051", Bytes::new())];

            let cases: [(fn(&mut InstallChaincodeRequest), &str); 4] = [
                (|install| install.name.clear(), "chaincode name"),
                (|install| install.path.clear(), "chaincode path"),
                (|install| install.version.clear(), "chaincode version"),
                (|install| install.package = None, "chaincode package"),
            ];
            for (mutate, field) in cases {
                let mut install = install_request();
                mutate(&mut install);
                let result = install_chaincode(&request, &client, &install, &targets).await;
                let Err(Error::Missing(missing)) = result else {
                    panic!("expected missing {field}");
                };
                assert_eq!(missing, field);
            }

            // Earlier fields are reported first
            let result = install_chaincode(
                &request,
                &client,
                &InstallChaincodeRequest::default(),
                &targets,
            )
            .await;
            assert!(matches!(result, Err(Error::Missing("chaincode name"))));
            assert!(targets[0].received().is_empty());
        });
    }

    #[test_traced]
    fn test_install_chaincode_no_targets() {
        let executor = deterministic::Runner::default();
        executor.start(|context| async move {
            let client = mocks::client("Org1MSP");
            let request = Request::new(context);
            let targets: Vec<Peer> = Vec::new();
            let result = install_chaincode(&request, &client, &install_request(), &targets).await;
            assert!(matches!(result, Err(Error::Missing("targets"))));
        });
    }
}
