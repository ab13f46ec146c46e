mod test_support;

use schoold::ServerConfig;
use serde_json::json;
use test_support::{
    add_student, add_subject, call, id_of, message_of, seed_school, send_raw, spawn_app,
};

#[tokio::test]
async fn health_reports_version() {
    let addr = spawn_app(ServerConfig::default()).await;
    let body = call(addr, "GET", "/healthz", None).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn admin_registration_rejects_taken_email_and_school_name() {
    let addr = spawn_app(ServerConfig::default()).await;
    let first = call(
        addr,
        "POST",
        "/AdminReg",
        Some(json!({
            "name": "Principal",
            "email": "head@north.test",
            "password": "pw",
            "schoolName": "North High",
        })),
    )
    .await;
    assert_eq!(first["role"], "Admin");
    assert!(first.get("password").is_none());

    let same_email = call(
        addr,
        "POST",
        "/AdminReg",
        Some(json!({
            "name": "Other",
            "email": "head@north.test",
            "password": "pw",
            "schoolName": "South High",
        })),
    )
    .await;
    assert_eq!(message_of(&same_email), "Email already exists");

    let same_school = call(
        addr,
        "POST",
        "/AdminReg",
        Some(json!({
            "name": "Other",
            "email": "head@south.test",
            "password": "pw",
            "schoolName": "North High",
        })),
    )
    .await;
    assert_eq!(message_of(&same_school), "School name already exists");

    let login = call(
        addr,
        "POST",
        "/AdminLogin",
        Some(json!({ "email": "head@north.test", "password": "pw" })),
    )
    .await;
    assert_eq!(login["_id"], first["_id"]);

    let blank = call(addr, "POST", "/AdminLogin", Some(json!({ "email": "" }))).await;
    assert_eq!(message_of(&blank), "Email and password are required");
}

#[tokio::test]
async fn subject_codes_are_unique_within_a_school() {
    let addr = spawn_app(ServerConfig::default()).await;
    let (school_id, class_id) = seed_school(addr, "North High").await;
    add_subject(addr, &school_id, &class_id, "MATH-7", 10).await;

    let dup = call(
        addr,
        "POST",
        "/SubjectCreate",
        Some(json!({
            "subjects": [
                { "subName": "Art", "subCode": "ART-7", "sessions": 5 },
                { "subName": "Maths again", "subCode": "MATH-7", "sessions": 5 },
            ],
            "sclassName": class_id,
            "adminID": school_id,
        })),
    )
    .await;
    assert_eq!(
        message_of(&dup),
        "Sorry this subcode must be unique as it already exists"
    );

    let all = call(addr, "GET", &format!("/AllSubjects/{school_id}"), None).await;
    assert_eq!(all.as_array().map(Vec::len), Some(1));

    let free = call(addr, "GET", &format!("/FreeSubjectList/{class_id}"), None).await;
    assert_eq!(free.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn teacher_takes_a_subject_off_the_free_list() {
    let addr = spawn_app(ServerConfig::default()).await;
    let (school_id, class_id) = seed_school(addr, "North High").await;
    let math = add_subject(addr, &school_id, &class_id, "MATH-7", 10).await;

    let teacher = call(
        addr,
        "POST",
        "/TeacherReg",
        Some(json!({
            "name": "Mr Hopper",
            "email": "hopper@north.test",
            "password": "pw",
            "school": school_id,
            "teachSubject": math,
            "teachSclass": class_id,
        })),
    )
    .await;
    assert_eq!(teacher["teachSubject"]["_id"], math.as_str());

    let free = call(addr, "GET", &format!("/FreeSubjectList/{class_id}"), None).await;
    assert_eq!(message_of(&free), "No subjects found");

    let teacher_id = id_of(&teacher);
    let marked = call(
        addr,
        "POST",
        &format!("/TeacherAttendance/{teacher_id}"),
        Some(json!({ "status": "Present", "date": "2024-03-01" })),
    )
    .await;
    assert_eq!(marked["attendance"][0]["status"], "Present");

    call(addr, "DELETE", &format!("/Teacher/{teacher_id}"), None).await;
    let free = call(addr, "GET", &format!("/FreeSubjectList/{class_id}"), None).await;
    assert_eq!(free.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn deleting_a_class_removes_its_students_and_subjects() {
    let addr = spawn_app(ServerConfig::default()).await;
    let (school_id, class_id) = seed_school(addr, "North High").await;
    add_subject(addr, &school_id, &class_id, "MATH-7", 10).await;
    let ada = add_student(addr, &school_id, &class_id, "Ada", 1).await;

    let other = call(
        addr,
        "POST",
        "/SclassCreate",
        Some(json!({ "sclassName": "7B", "adminID": school_id })),
    )
    .await;
    let other_id = id_of(&other);
    let grace = add_student(addr, &school_id, &other_id, "Grace", 1).await;

    let gone = call(addr, "DELETE", &format!("/Sclass/{class_id}"), None).await;
    assert_eq!(gone["sclassName"], "7A");

    let ada_detail = call(addr, "GET", &format!("/employee/{ada}"), None).await;
    assert_eq!(message_of(&ada_detail), "No employee found");
    let grace_detail = call(addr, "GET", &format!("/employee/{grace}"), None).await;
    assert_eq!(grace_detail["name"], "Grace");
    let subjects = call(addr, "GET", &format!("/AllSubjects/{school_id}"), None).await;
    assert_eq!(message_of(&subjects), "No subjects found");

    let dup = call(
        addr,
        "POST",
        "/SclassCreate",
        Some(json!({ "sclassName": "7B", "adminID": school_id })),
    )
    .await;
    assert_eq!(message_of(&dup), "Sorry this class name already exists");
}

#[tokio::test]
async fn deleting_an_admin_removes_the_whole_school() {
    let addr = spawn_app(ServerConfig::default()).await;
    let (school_id, class_id) = seed_school(addr, "North High").await;
    let ada = add_student(addr, &school_id, &class_id, "Ada", 1).await;
    call(
        addr,
        "POST",
        "/NoticeCreate",
        Some(json!({
            "title": "Sports day",
            "details": "Bring water",
            "date": "2024-05-01",
            "adminID": school_id,
        })),
    )
    .await;

    call(addr, "DELETE", &format!("/Admin/{school_id}"), None).await;

    let admin = call(addr, "GET", &format!("/Admin/{school_id}"), None).await;
    assert_eq!(message_of(&admin), "No admin found");
    let student = call(addr, "GET", &format!("/employee/{ada}"), None).await;
    assert_eq!(message_of(&student), "No employee found");
    let notices = call(addr, "GET", &format!("/NoticeList/{school_id}"), None).await;
    assert_eq!(message_of(&notices), "No notices found");
}

#[tokio::test]
async fn notices_and_complaints_are_listed_per_school() {
    let addr = spawn_app(ServerConfig::default()).await;
    let (school_id, class_id) = seed_school(addr, "North High").await;
    let ada = add_student(addr, &school_id, &class_id, "Ada", 1).await;

    let empty = call(addr, "GET", &format!("/ComplainList/{school_id}"), None).await;
    assert_eq!(message_of(&empty), "No complains found");

    let ghost = call(
        addr,
        "POST",
        "/ComplainCreate",
        Some(json!({
            "user": "no-such-student",
            "date": "2024-02-02",
            "complaint": "Anonymous",
            "school": school_id,
        })),
    )
    .await;
    assert_eq!(message_of(&ghost), "Student not found");

    call(
        addr,
        "POST",
        "/ComplainCreate",
        Some(json!({
            "user": ada,
            "date": "2024-02-02",
            "complaint": "Too much homework",
            "school": school_id,
        })),
    )
    .await;
    let complaints = call(addr, "GET", &format!("/ComplainList/{school_id}"), None).await;
    assert_eq!(complaints[0]["user"]["name"], "Ada");

    let notice = call(
        addr,
        "POST",
        "/NoticeCreate",
        Some(json!({
            "title": "Sports day",
            "details": "Bring water",
            "date": "2024-05-01",
            "adminID": school_id,
        })),
    )
    .await;
    let notice_id = id_of(&notice);
    let edited = call(
        addr,
        "PUT",
        &format!("/Notice/{notice_id}"),
        Some(json!({ "details": "Bring water and a hat" })),
    )
    .await;
    assert_eq!(edited["details"], "Bring water and a hat");
    assert_eq!(edited["title"], "Sports day");

    let removed = call(addr, "DELETE", &format!("/Notices/{school_id}"), None).await;
    assert_eq!(removed["deletedCount"], 1);
}

#[tokio::test]
async fn cors_preflight_echoes_configured_origin() {
    let config = ServerConfig {
        cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        ..ServerConfig::default()
    };
    let addr = spawn_app(config).await;

    let (status, head, _) = send_raw(
        addr,
        "OPTIONS",
        "/employeeReg",
        &[("Origin", "http://localhost:3000")],
        None,
    )
    .await;
    assert_eq!(status, 204);
    let head = head.to_ascii_lowercase();
    assert!(head.contains("access-control-allow-origin: http://localhost:3000"));
    assert!(head.contains("access-control-allow-methods: get,post,put,delete,options"));

    let (_, head, _) = send_raw(
        addr,
        "GET",
        "/healthz",
        &[("Origin", "http://evil.test")],
        None,
    )
    .await;
    assert!(!head.to_ascii_lowercase().contains("access-control-allow-origin"));
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let config = ServerConfig {
        max_body_bytes: 64,
        ..ServerConfig::default()
    };
    let addr = spawn_app(config).await;
    let big = json!({ "title": "x".repeat(200), "details": "d", "date": "2024-01-01", "adminID": "s" })
        .to_string();
    let (status, _, _) = send_raw(addr, "POST", "/NoticeCreate", &[], Some(&big)).await;
    assert_eq!(status, 400);
}
