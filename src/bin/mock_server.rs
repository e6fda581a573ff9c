//! Mock permission-gated tool server for integration testing
//!
//! Implements just enough of both wire surfaces to exercise the harness
//! without a real backend: newline-delimited JSON-RPC on stdin/stdout by
//! default, and a minimal HTTP responder behind `--http <port>`. The
//! policy is the reference table the built-in scenarios assume: reads
//! allowed, message sends allowed, every other mutation denied.

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};

const OPERATIONS: &[&str] = &[
    "get_dept_list",
    "get_dept_user_list",
    "get_dept_alias_list",
    "create_dept",
    "update_dept",
    "delete_dept",
    "get_group_list",
    "get_group_info",
    "create_group",
    "update_group",
    "delete_group",
    "add_group_member",
    "del_group_member",
    "send_text_message",
    "send_image_message",
    "send_file_message",
    "send_link_message",
    "send_sys_message",
    "create_session",
    "get_session",
    "update_session",
    "send_text_session_message",
    "send_image_session_message",
    "send_file_session_message",
    "get_user",
    "create_user",
    "update_user",
    "delete_user",
];

fn capability(operation: &str) -> &'static str {
    if operation.starts_with("get_") {
        "read"
    } else if operation.starts_with("delete_") || operation.starts_with("del_") {
        "delete"
    } else {
        "create"
    }
}

fn allowed(operation: &str) -> bool {
    match capability(operation) {
        "read" => true,
        "create" => operation.starts_with("send_"),
        _ => false,
    }
}

fn denial_message(operation: &str) -> String {
    format!(
        "permission denied: {} requires {} capability",
        operation,
        capability(operation)
    )
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if let Some(pos) = args.iter().position(|a| a == "--http") {
        let port: u16 = args
            .get(pos + 1)
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        run_http(port);
    } else {
        run_stdio();
    }
}

// ===== stdio JSON-RPC =====

fn run_stdio() {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let reader = BufReader::new(stdin.lock());
    let mut writer = stdout.lock();

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(_) => {
                send_line(
                    &mut writer,
                    &json!({
                        "jsonrpc": "2.0",
                        "id": null,
                        "error": {"code": -32700, "message": "parse error"},
                    }),
                );
                continue;
            }
        };

        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let method = request.get("method").and_then(Value::as_str).unwrap_or("");
        let params = request.get("params").cloned().unwrap_or(json!({}));

        let response = match method {
            "initialize" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": "2024-11-05",
                    "serverInfo": {"name": "mock-server", "version": env!("CARGO_PKG_VERSION")},
                    "capabilities": {"tools": {}},
                },
            }),
            "tools/list" => {
                let tools: Vec<Value> = OPERATIONS
                    .iter()
                    .map(|name| {
                        json!({
                            "name": name,
                            "description": format!("{} operation", name),
                        })
                    })
                    .collect();
                json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {"tools": tools},
                })
            }
            "tools/call" => {
                let name = params.get("name").and_then(Value::as_str).unwrap_or("");
                if !OPERATIONS.contains(&name) {
                    json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": {"code": -32602, "message": format!("unknown tool: {}", name)},
                    })
                } else if allowed(name) {
                    json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "result": {
                            "content": [{"type": "text", "text": format!("{} ok", name)}],
                        },
                    })
                } else {
                    // Application-level denial, nested inside a successful result
                    json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "result": {
                            "isError": true,
                            "content": [{"type": "text", "text": denial_message(name)}],
                        },
                    })
                }
            }
            _ => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32601, "message": format!("method not found: {}", method)},
            }),
        };

        send_line(&mut writer, &response);
    }
}

fn send_line<W: Write>(writer: &mut W, message: &Value) {
    let line = message.to_string();
    writer.write_all(line.as_bytes()).ok();
    writer.write_all(b"\n").ok();
    writer.flush().ok();
}

// ===== HTTP =====

fn run_http(port: u16) {
    let listener = match TcpListener::bind(("127.0.0.1", port)) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("mock-server: failed to bind port {}: {}", port, e);
            std::process::exit(1);
        }
    };
    eprintln!("mock-server: listening on 127.0.0.1:{}", port);

    for stream in listener.incoming() {
        if let Ok(stream) = stream {
            handle_connection(stream);
        }
    }
}

fn handle_connection(stream: TcpStream) {
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });
    let mut stream = stream;

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();

    // Headers: only Content-Length matters
    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).unwrap_or(0) == 0 {
            break;
        }
        if header == "\r\n" || header == "\n" {
            break;
        }
        let lower = header.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }

    let mut body = vec![0u8; content_length];
    if content_length > 0 && reader.read_exact(&mut body).is_err() {
        return;
    }

    let (status, payload) = route(&method, &path);
    let body = payload.to_string();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).ok();
    stream.flush().ok();
}

fn route(method: &str, path: &str) -> (&'static str, Value) {
    match (method, path) {
        ("GET", "/health") => ("200 OK", json!({"status": "ok"})),
        ("GET", "/endpoints") => ("200 OK", json!({"endpoints": OPERATIONS})),
        ("POST", _) if path.starts_with("/api/v1/") => {
            let operation = &path["/api/v1/".len()..];
            if !OPERATIONS.contains(&operation) {
                (
                    "404 Not Found",
                    json!({"error": format!("unknown operation: {}", operation)}),
                )
            } else if allowed(operation) {
                (
                    "200 OK",
                    json!({"data": {"operation": operation, "status": "ok"}}),
                )
            } else {
                ("403 Forbidden", json!({"error": denial_message(operation)}))
            }
        }
        _ => ("404 Not Found", json!({"error": "not found"})),
    }
}
