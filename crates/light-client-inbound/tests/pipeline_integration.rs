//! End-to-end tests of the inbound pipeline over in-memory and loopback
//! TCP connections.

use std::sync::Arc;
use std::time::Duration;

use light_client_inbound::{
    connect_and_run, decode_body, decode_message, encode_body, encode_message, listen,
    read_frame, run_connection, write_frame, Connection, Connector, Endpoint, InboundConfig,
    InMemoryTransactionStore, MessageDispatcher, MockConnector, OutputChannels, OutputReceivers,
    PeerInfo, TcpConnector, MAX_FRAME_LEN,
};
use shared_types::{
    AccountState, InitConnection, Message, Receipt, ReceiptStatus, SmartContractInfo,
    SmartContractState, SmartContractStateResult, Transaction,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn build(connector: Arc<dyn Connector>) -> (Arc<MessageDispatcher>, OutputReceivers) {
    let config = InboundConfig::for_testing();
    let (outputs, receivers) = OutputChannels::bounded(&config);
    let dispatcher = MessageDispatcher::new(
        config,
        outputs,
        Arc::new(InMemoryTransactionStore::new()),
        connector,
    );
    (Arc::new(dispatcher), receivers)
}

fn accepted(stream: DuplexStream) -> Connection {
    Connection::new(Box::new(stream), PeerInfo::accepted(Endpoint::new("198.51.100.7", 4200)))
}

fn frame_of<T: serde::Serialize>(command: &str, record: &T) -> Vec<u8> {
    encode_message(&Message::new(command, encode_body(record).unwrap())).unwrap()
}

async fn read_message<S: tokio::io::AsyncRead + Unpin>(stream: &mut S) -> Message {
    let payload = timeout(WAIT, read_frame(stream, MAX_FRAME_LEN))
        .await
        .expect("frame in time")
        .unwrap()
        .expect("frame before EOF");
    decode_message(&payload).unwrap()
}

fn transaction(byte: u8) -> Transaction {
    Transaction {
        hash: [byte; 32],
        from_address: [1u8; 20],
        to_address: [2u8; 20],
        amount: vec![0x0f, 0x42, 0x40],
        ..Default::default()
    }
}

#[tokio::test]
async fn get_transaction_result_reaches_transaction_output() {
    let (dispatcher, mut receivers) = build(Arc::new(MockConnector::failing()));
    let (local, mut remote) = tokio::io::duplex(4096);

    write_frame(&mut remote, &frame_of("GetTransactionResult", &transaction(0xab)))
        .await
        .unwrap();
    drop(remote);

    run_connection(dispatcher, accepted(local)).await;

    let delivered = receivers.transaction.try_recv().unwrap();
    assert_eq!(delivered.hash, [0xab; 32]);
}

#[tokio::test]
async fn get_transaction_result_without_consumer_is_dropped_quietly() {
    let (dispatcher, receivers) = build(Arc::new(MockConnector::failing()));
    drop(receivers);
    let (local, mut remote) = tokio::io::duplex(4096);

    for byte in 0..3 {
        write_frame(&mut remote, &frame_of("GetTransactionResult", &transaction(byte)))
            .await
            .unwrap();
    }
    drop(remote);

    run_connection(Arc::clone(&dispatcher), accepted(local)).await;

    assert_eq!(dispatcher.outputs().transaction.dropped(), 3);
    assert_eq!(dispatcher.metrics().snapshot().messages_decoded, 3);
}

#[tokio::test]
async fn empty_account_state_published_to_both_outputs() {
    let (dispatcher, mut receivers) = build(Arc::new(MockConnector::failing()));
    let (local, mut remote) = tokio::io::duplex(4096);

    let envelope = encode_message(&Message::new("AccountState", vec![])).unwrap();
    write_frame(&mut remote, &envelope).await.unwrap();
    drop(remote);

    run_connection(dispatcher, accepted(local)).await;

    let dedicated = receivers.account_state.try_recv().unwrap();
    let general = receivers.general.try_recv().unwrap();
    assert_eq!(dedicated, AccountState::empty());
    assert_eq!(general, AccountState::empty());
}

#[tokio::test]
async fn unknown_command_writes_nothing_and_keeps_reading() {
    let (dispatcher, mut receivers) = build(Arc::new(MockConnector::failing()));
    let (local, mut remote) = tokio::io::duplex(4096);

    let unknown = encode_message(&Message::new("Gossip", vec![1, 2, 3])).unwrap();
    write_frame(&mut remote, &unknown).await.unwrap();
    write_frame(&mut remote, &frame_of("GetTransactionResult", &transaction(1)))
        .await
        .unwrap();
    drop(remote);

    run_connection(Arc::clone(&dispatcher), accepted(local)).await;

    assert_eq!(dispatcher.metrics().snapshot().unknown_commands, 1);
    assert!(receivers.account_state.try_recv().is_err());
    assert!(receivers.receipt.try_recv().is_err());
    assert!(receivers.general.try_recv().is_err());
    // The frame after the unknown one was still handled.
    assert!(receivers.transaction.try_recv().is_ok());
}

#[tokio::test]
async fn truncated_frame_runs_no_handler() {
    let (dispatcher, mut receivers) = build(Arc::new(MockConnector::failing()));
    let (local, mut remote) = tokio::io::duplex(4096);

    let envelope = frame_of("GetTransactionResult", &transaction(1));
    remote
        .write_all(&(envelope.len() as u64).to_le_bytes())
        .await
        .unwrap();
    remote.write_all(&envelope[..envelope.len() / 2]).await.unwrap();
    drop(remote);

    run_connection(Arc::clone(&dispatcher), accepted(local)).await;

    let snapshot = dispatcher.metrics().snapshot();
    assert_eq!(snapshot.frames_read, 0);
    assert_eq!(snapshot.connections_closed, 1);
    assert!(receivers.transaction.try_recv().is_err());
}

#[tokio::test]
async fn oversize_frame_closes_before_payload() {
    let (dispatcher, mut receivers) = build(Arc::new(MockConnector::failing()));
    let (local, mut remote) = tokio::io::duplex(4096);

    let limit = dispatcher.config().max_frame_len;
    remote.write_all(&(limit + 1).to_le_bytes()).await.unwrap();
    // A valid envelope right behind the prefix must not be handled.
    remote
        .write_all(&frame_of("GetTransactionResult", &transaction(1)))
        .await
        .unwrap();

    timeout(WAIT, run_connection(Arc::clone(&dispatcher), accepted(local)))
        .await
        .expect("loop ends on oversize prefix");

    assert_eq!(dispatcher.metrics().snapshot().oversize_frames, 1);
    assert!(receivers.transaction.try_recv().is_err());
}

#[tokio::test]
async fn storage_host_receives_one_request_with_account_address() {
    let (connector, mut remotes) = MockConnector::new();
    let connector = Arc::new(connector);
    let (dispatcher, _receivers) = build(connector.clone());
    let (local, mut remote) = tokio::io::duplex(4096);

    let address = [0x5a; 20];
    let account = AccountState {
        address,
        smart_contract_info: Some(SmartContractInfo {
            storage_host: "203.0.113.5:9000".to_string(),
        }),
        ..Default::default()
    };
    write_frame(&mut remote, &frame_of("AccountState", &account))
        .await
        .unwrap();

    let primary = tokio::spawn(run_connection(Arc::clone(&dispatcher), accepted(local)));

    let (endpoint, mut storage) = timeout(WAIT, remotes.recv())
        .await
        .expect("connect in time")
        .expect("connect attempted");
    assert_eq!(endpoint, Endpoint::new("203.0.113.5", 9000));

    let request = read_message(&mut storage).await;
    assert_eq!(request.command(), "MinerGetSmartContractState");
    assert_eq!(request.body, address.to_vec());

    // Reply; the handler closes the secondary connection afterwards.
    let result = SmartContractStateResult {
        address,
        smart_contract_state: SmartContractState {
            code: vec![0x60, 0x80, 0x60, 0x40],
            storage: [("1".to_string(), vec![0xff])].into_iter().collect(),
        },
    };
    write_frame(&mut storage, &frame_of("MinerGetSmartContractStateResult", &result))
        .await
        .unwrap();

    let mut rest = Vec::new();
    let read = timeout(WAIT, storage.read_to_end(&mut rest))
        .await
        .expect("secondary closed in time")
        .unwrap();
    assert_eq!(read, 0, "exactly one request is sent");

    assert_eq!(connector.attempts().len(), 1);
    assert_eq!(dispatcher.metrics().snapshot().secondary_attempted, 1);

    drop(remote);
    timeout(WAIT, primary).await.unwrap().unwrap();
}

#[tokio::test]
async fn parent_connection_over_tcp_sends_handshake_and_publishes() {
    let parent = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let parent_addr = parent.local_addr().unwrap();
    let (dispatcher, mut receivers) = build(Arc::new(TcpConnector::new()));

    let (handle, accepted) = tokio::join!(
        connect_and_run(Arc::clone(&dispatcher), Endpoint::from(parent_addr)),
        parent.accept()
    );
    let handle = handle.unwrap();
    let (mut node, _) = accepted.unwrap();

    let handshake = read_message(&mut node).await;
    assert_eq!(handshake.command(), "InitConnection");
    let init: InitConnection = decode_body(&handshake.body).unwrap();
    assert_eq!(init.node_type, "Client");
    assert_eq!(init.address, dispatcher.config().local_address);

    let receipt = Receipt {
        transaction_hash: [0xcd; 32],
        amount: vec![0x01],
        status: ReceiptStatus::Success,
        ..Default::default()
    };
    write_frame(&mut node, &frame_of("Receipt", &receipt)).await.unwrap();

    let delivered = timeout(WAIT, receivers.receipt.recv()).await.unwrap().unwrap();
    assert_eq!(delivered, receipt);

    drop(node);
    timeout(WAIT, handle).await.unwrap().unwrap();
    assert_eq!(dispatcher.metrics().snapshot().connections_closed, 1);
}

#[tokio::test]
async fn listener_accepts_peer_and_dispatches() {
    let (dispatcher, mut receivers) = build(Arc::new(TcpConnector::new()));
    let (addr, server) = listen("127.0.0.1:0".parse().unwrap(), Arc::clone(&dispatcher))
        .await
        .unwrap();

    let mut peer = TcpStream::connect(addr).await.unwrap();
    let handshake = read_message(&mut peer).await;
    assert_eq!(handshake.command(), "InitConnection");

    write_frame(&mut peer, &frame_of("GetTransactionResult", &transaction(0x77)))
        .await
        .unwrap();
    let delivered = timeout(WAIT, receivers.transaction.recv()).await.unwrap().unwrap();
    assert_eq!(delivered.hash, [0x77; 32]);

    server.abort();
}
