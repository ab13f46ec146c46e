#![allow(dead_code)]

use schoold::{build_router, db, AppState, ServerConfig};
use serde_json::Value;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Serves a fresh in-memory database on an ephemeral port.
pub async fn spawn_app(config: ServerConfig) -> SocketAddr {
    let conn = db::open_in_memory().expect("open in-memory db");
    let app = build_router(AppState::new(conn, config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    addr
}

pub async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    match body {
        Some(b) => {
            req.push_str("Content-Type: application/json\r\n");
            req.push_str(&format!("Content-Length: {}\r\n\r\n{b}", b.len()));
        }
        None => req.push_str("\r\n"),
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head.to_string(), body.to_string())
}

/// Sends JSON (or nothing) and expects a 200 with a JSON body.
pub async fn call(addr: SocketAddr, method: &str, path: &str, body: Option<Value>) -> Value {
    let text = body.map(|b| b.to_string());
    let (status, _, resp) = send_raw(addr, method, path, &[], text.as_deref()).await;
    assert_eq!(status, 200, "{method} {path} -> {resp}");
    serde_json::from_str(&resp).expect("json body")
}

pub fn id_of(v: &Value) -> String {
    v["_id"].as_str().expect("_id").to_string()
}

pub fn message_of(v: &Value) -> &str {
    v["message"].as_str().unwrap_or("")
}

/// Admin plus one class. Returns (school id, class id).
pub async fn seed_school(addr: SocketAddr, school_name: &str) -> (String, String) {
    let admin = call(
        addr,
        "POST",
        "/AdminReg",
        Some(serde_json::json!({
            "name": "Principal",
            "email": format!("{}@school.test", school_name.replace(' ', ".")),
            "password": "admin-pass",
            "schoolName": school_name,
        })),
    )
    .await;
    let school_id = id_of(&admin);
    let class = call(
        addr,
        "POST",
        "/SclassCreate",
        Some(serde_json::json!({ "sclassName": "7A", "adminID": school_id })),
    )
    .await;
    (school_id, id_of(&class))
}

pub async fn add_subject(
    addr: SocketAddr,
    school_id: &str,
    class_id: &str,
    code: &str,
    sessions: u32,
) -> String {
    let created = call(
        addr,
        "POST",
        "/SubjectCreate",
        Some(serde_json::json!({
            "subjects": [{ "subName": format!("Subject {code}"), "subCode": code, "sessions": sessions }],
            "sclassName": class_id,
            "adminID": school_id,
        })),
    )
    .await;
    id_of(&created[0])
}

pub async fn add_student(
    addr: SocketAddr,
    school_id: &str,
    class_id: &str,
    name: &str,
    roll_num: i64,
) -> String {
    let created = call(
        addr,
        "POST",
        "/employeeReg",
        Some(serde_json::json!({
            "name": name,
            "rollNum": roll_num,
            "password": "secret",
            "sclassName": class_id,
            "adminID": school_id,
        })),
    )
    .await;
    id_of(&created)
}
