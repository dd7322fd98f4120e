use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::thread;

use ctorprops::api::server::{Server, ServerState};
use ctorprops::application::analyzers_from;
use ctorprops::config::AnalyzerConfig;
use ctorprops::domain::fix::FixOptions;
use serde_json::{json, Value};

fn send(stream: &mut TcpStream, reader: &mut BufReader<TcpStream>, request: Value) -> Value {
    stream.write_all(request.to_string().as_bytes()).unwrap();
    stream.write_all(b"\n").unwrap();
    let mut response = String::new();
    reader.read_line(&mut response).unwrap();
    serde_json::from_str(&response).unwrap()
}

#[test]
fn server_lifecycle() {
    let options = FixOptions::default();
    let state = ServerState::new(analyzers_from(&AnalyzerConfig::default(), &options), options);
    // Port 0 lets the OS pick a free port.
    let server = Server::bind("127.0.0.1:0", state).unwrap();
    let address = server.local_addr().unwrap();
    let handle = thread::spawn(move || server.run());

    let mut stream = TcpStream::connect(address).expect("Failed to connect to server");
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let pong = send(&mut stream, &mut reader, json!({"command": "PING"}));
    assert_eq!(pong, json!({"status": "success", "data": "PONG"}));

    let analyzed = send(
        &mut stream,
        &mut reader,
        json!({"command": "ANALYZE", "params": {"uri": "w.cs", "text": "class W { W(int size) { } }"}}),
    );
    assert_eq!(analyzed["status"], "success");
    assert_eq!(analyzed["data"]["diagnostics"][0]["id"], "CP0001");
    assert_eq!(analyzed["data"]["diagnostics"][0]["fixable"], true);

    // FIX reuses the document sent with ANALYZE.
    let fixed = send(&mut stream, &mut reader, json!({"command": "FIX", "params": {"uri": "w.cs"}}));
    assert_eq!(fixed["status"], "success");
    assert_eq!(
        fixed["data"]["text"],
        "class W { public int Size { get; } W(int size) { Size = size; } }"
    );
    assert_eq!(fixed["data"]["constructors"][0]["added"], json!(["Size"]));

    let missing = send(
        &mut stream,
        &mut reader,
        json!({"command": "ANALYZE", "params": {"path": "/invalid/path/Missing.cs"}}),
    );
    assert_eq!(missing["status"], "error");
    assert!(missing["message"].as_str().unwrap().contains("Failed to read file"));

    let bye = send(&mut stream, &mut reader, json!({"command": "SHUTDOWN"}));
    assert_eq!(bye["status"], "success");

    handle.join().unwrap().unwrap();
}
