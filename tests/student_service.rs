use chrono::NaiveDate;
use school_records::model::{NewStudent, StudentForm};
use school_records::service::{DeleteOutcome, FormOutcome, ListParams, RejectionKind, DELETE_FAILED_MESSAGE, SAVE_FAILED_MESSAGE};
use school_records::{AppError, InMemoryStore, SchoolContext, SchoolStore, StudentService};
use std::sync::Arc;

async fn store_with(rows: &[(&str, &str, i32)]) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    for (last, first, year) in rows {
        store
            .insert_student(&NewStudent {
                last_name: last.to_string(),
                first_mid_name: first.to_string(),
                enrollment_date: NaiveDate::from_ymd_opt(*year, 9, 1).unwrap(),
            })
            .await
            .unwrap();
    }
    store
}

/// Seven students; only "Brandt" and "Joanne" contain "an".
async fn seven_students() -> Arc<InMemoryStore> {
    store_with(&[
        ("Nguyen", "Duc", 2004),
        ("Kowalski", "Ewa", 2002),
        ("Brandt", "Ola", 2003),
        ("Smith", "Joanne", 2001),
        ("Okafor", "Chidi", 2005),
        ("Lee", "Min", 2000),
        ("Costa", "Rui", 2006),
    ])
    .await
}

fn params(sort: Option<&str>, search: Option<&str>, filter: Option<&str>, page: Option<i64>) -> ListParams {
    ListParams {
        sort_order: sort.map(String::from),
        search_string: search.map(String::from),
        current_filter: filter.map(String::from),
        page,
    }
}

fn form(last: Option<&str>, first: Option<&str>, date: Option<&str>) -> StudentForm {
    StudentForm {
        last_name: last.map(String::from),
        first_mid_name: first.map(String::from),
        enrollment_date: date.map(String::from),
    }
}

#[tokio::test]
async fn search_by_date_fits_on_one_page() {
    let store = seven_students().await;
    let ctx = SchoolContext::new(store);
    let index = StudentService::list(&ctx, params(Some("Date"), Some("an"), None, Some(1)))
        .await
        .unwrap();
    let names: Vec<_> = index.students.iter().map(|s| s.last_name.as_str()).collect();
    assert_eq!(names, vec!["Smith", "Brandt"]);
    assert_eq!(index.total_count, 2);
    assert_eq!(index.total_pages, 1);
    assert!(!index.has_next_page);
    assert!(!index.has_previous_page);
    assert_eq!(index.date_sort_parm, "date_desc");
    assert_eq!(index.name_sort_parm, "");
    assert_eq!(index.current_filter.as_deref(), Some("an"));
}

#[tokio::test]
async fn default_listing_pages_by_three() {
    let ctx = SchoolContext::new(seven_students().await);
    let first = StudentService::list(&ctx, ListParams::default()).await.unwrap();
    assert_eq!(first.page_size, 3);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.name_sort_parm, "name_desc");
    assert_eq!(first.date_sort_parm, "Date");
    let names: Vec<_> = first.students.iter().map(|s| s.last_name.as_str()).collect();
    assert_eq!(names, vec!["Brandt", "Costa", "Kowalski"]);

    let last = StudentService::list(&ctx, params(None, None, None, Some(3))).await.unwrap();
    assert_eq!(last.students.len(), 1);
    assert_eq!(last.students[0].last_name, "Smith");
    assert!(last.has_previous_page);
    assert!(!last.has_next_page);
}

#[tokio::test]
async fn each_sort_token_orders_by_its_key() {
    let ctx = SchoolContext::new(seven_students().await);
    let all = |sort: Option<&'static str>| {
        let ctx = &ctx;
        async move {
            let mut out = Vec::new();
            for page in 1..=3 {
                let index = StudentService::list(ctx, params(sort, None, None, Some(page))).await.unwrap();
                out.extend(index.students);
            }
            out
        }
    };

    let asc = all(None).await;
    assert!(asc.windows(2).all(|w| w[0].last_name <= w[1].last_name));
    let mut desc = all(Some("name_desc")).await;
    assert!(desc.windows(2).all(|w| w[0].last_name >= w[1].last_name));
    desc.reverse();
    assert_eq!(desc, asc);

    let by_date = all(Some("Date")).await;
    assert!(by_date.windows(2).all(|w| w[0].enrollment_date <= w[1].enrollment_date));
    let by_date_desc = all(Some("date_desc")).await;
    assert!(by_date_desc.windows(2).all(|w| w[0].enrollment_date >= w[1].enrollment_date));
    assert_eq!(by_date_desc.len(), 7);
}

#[tokio::test]
async fn search_string_presence_resets_page() {
    let ctx = SchoolContext::new(seven_students().await);
    let index = StudentService::list(&ctx, params(None, Some(""), None, Some(3))).await.unwrap();
    assert_eq!(index.page_index, 1);
    assert_eq!(index.total_count, 7);
}

#[tokio::test]
async fn current_filter_survives_paging() {
    let ctx = SchoolContext::new(seven_students().await);
    let index = StudentService::list(&ctx, params(Some("name_desc"), None, Some("an"), Some(1)))
        .await
        .unwrap();
    let names: Vec<_> = index.students.iter().map(|s| s.last_name.as_str()).collect();
    assert_eq!(names, vec!["Smith", "Brandt"]);
    assert_eq!(index.current_filter.as_deref(), Some("an"));
    assert_eq!(index.current_sort.as_deref(), Some("name_desc"));
}

#[tokio::test]
async fn filtering_twice_gives_the_same_set() {
    let store = seven_students().await;
    let ctx = SchoolContext::new(store);
    let once = ctx.students().name_contains("o").to_vec().await.unwrap();
    let twice: Vec<_> = once
        .iter()
        .filter(|s| s.last_name.contains('o') || s.first_mid_name.contains('o'))
        .cloned()
        .collect();
    assert_eq!(once, twice);
}

#[tokio::test]
async fn created_student_is_retrievable() {
    let store = Arc::new(InMemoryStore::new());
    let mut ctx = SchoolContext::new(store.clone());
    let outcome = StudentService::create(&mut ctx, form(Some("Li"), Some("Yan"), Some("2002-09-01")))
        .await
        .unwrap();
    let FormOutcome::Saved(saved) = outcome else {
        panic!("expected save");
    };
    let ctx = SchoolContext::new(store);
    let detail = StudentService::detail(&ctx, Some(saved.id)).await.unwrap();
    assert_eq!(detail.student.last_name, "Li");
    assert_eq!(detail.student.first_mid_name, "Yan");
    assert_eq!(detail.student.enrollment_date, NaiveDate::from_ymd_opt(2002, 9, 1).unwrap());
    assert!(detail.enrollments.is_empty());
}

#[tokio::test]
async fn create_with_missing_field_keeps_attempted_values() {
    let store = Arc::new(InMemoryStore::new());
    let mut ctx = SchoolContext::new(store.clone());
    let attempted = form(Some("Li"), None, Some("2002-09-01"));
    let outcome = StudentService::create(&mut ctx, attempted.clone()).await.unwrap();
    let FormOutcome::Rejected(rejection) = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(rejection.kind, RejectionKind::Invalid);
    assert_eq!(rejection.values, attempted);
    assert_eq!(rejection.errors[0].field, Some("first_mid_name"));
    assert_eq!(store.student_count(), 0);
}

#[tokio::test]
async fn create_save_failure_is_generic() {
    let store = Arc::new(InMemoryStore::new());
    store.set_fail_writes(true);
    let mut ctx = SchoolContext::new(store);
    let attempted = form(Some("Li"), Some("Yan"), Some("2002-09-01"));
    let FormOutcome::Rejected(rejection) = StudentService::create(&mut ctx, attempted.clone()).await.unwrap() else {
        panic!("expected rejection");
    };
    assert_eq!(rejection.kind, RejectionKind::SaveFailed);
    assert_eq!(rejection.values, attempted);
    assert_eq!(rejection.errors.len(), 1);
    assert_eq!(rejection.errors[0].field, None);
    assert_eq!(rejection.errors[0].message, SAVE_FAILED_MESSAGE);
}

#[tokio::test]
async fn edit_never_changes_identity() {
    let store = seven_students().await;
    let mut ctx = SchoolContext::new(store.clone());
    let payload: StudentForm = serde_json::from_value(serde_json::json!({
        "id": 1000,
        "last_name": "Nguyen-Tran"
    }))
    .unwrap();
    let FormOutcome::Saved(saved) = StudentService::apply_edit(&mut ctx, Some(1), payload).await.unwrap() else {
        panic!("expected save");
    };
    assert_eq!(saved.id, 1);
    assert_eq!(saved.last_name, "Nguyen-Tran");
    assert_eq!(saved.first_mid_name, "Duc");
    assert!(store.find_student(1000).await.unwrap().is_none());
}

#[tokio::test]
async fn edit_without_id_or_row_is_not_found() {
    let mut ctx = SchoolContext::new(seven_students().await);
    let err = StudentService::apply_edit(&mut ctx, None, StudentForm::default()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = StudentService::apply_edit(&mut ctx, Some(77), StudentForm::default()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = StudentService::load_for_edit(&ctx, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn invalid_edit_is_redisplayed_with_id() {
    let store = seven_students().await;
    let mut ctx = SchoolContext::new(store.clone());
    let attempted = form(Some(" "), None, None);
    let FormOutcome::Rejected(rejection) = StudentService::apply_edit(&mut ctx, Some(2), attempted.clone()).await.unwrap() else {
        panic!("expected rejection");
    };
    assert_eq!(rejection.id, Some(2));
    assert_eq!(rejection.values, attempted);
    assert_eq!(store.find_student(2).await.unwrap().unwrap().last_name, "Kowalski");
}

#[tokio::test]
async fn edit_save_failure_keeps_values_and_row() {
    let store = seven_students().await;
    store.set_fail_writes(true);
    let mut ctx = SchoolContext::new(store.clone());
    let attempted = form(Some("Kowalska"), None, Some("2003-02-01"));
    let FormOutcome::Rejected(rejection) = StudentService::apply_edit(&mut ctx, Some(2), attempted.clone()).await.unwrap() else {
        panic!("expected rejection");
    };
    assert_eq!(rejection.kind, RejectionKind::SaveFailed);
    assert_eq!(rejection.id, Some(2));
    assert_eq!(rejection.values, attempted);
    assert_eq!(rejection.errors.len(), 1);
    assert_eq!(rejection.errors[0].message, SAVE_FAILED_MESSAGE);

    let row = store.find_student(2).await.unwrap().unwrap();
    assert_eq!(row.last_name, "Kowalski");
    assert_eq!(row.enrollment_date, NaiveDate::from_ymd_opt(2002, 9, 1).unwrap());
}

#[tokio::test]
async fn last_writer_wins() {
    let store = seven_students().await;
    let mut first = SchoolContext::new(store.clone());
    let mut second = SchoolContext::new(store.clone());
    StudentService::apply_edit(&mut first, Some(3), form(None, Some("Olga"), None)).await.unwrap();
    StudentService::apply_edit(&mut second, Some(3), form(None, Some("Oliwia"), None)).await.unwrap();
    assert_eq!(store.find_student(3).await.unwrap().unwrap().first_mid_name, "Oliwia");
}

#[tokio::test]
async fn deleting_a_missing_student_twice_succeeds() {
    let store = seven_students().await;
    let mut ctx = SchoolContext::new(store.clone());
    assert_eq!(StudentService::execute_delete(&mut ctx, 404).await, DeleteOutcome::AlreadyAbsent);
    assert_eq!(StudentService::execute_delete(&mut ctx, 404).await, DeleteOutcome::AlreadyAbsent);
    assert_eq!(StudentService::execute_delete(&mut ctx, 1).await, DeleteOutcome::Deleted);
    assert_eq!(StudentService::execute_delete(&mut ctx, 1).await, DeleteOutcome::AlreadyAbsent);
    assert_eq!(store.student_count(), 6);
}

#[tokio::test]
async fn failed_delete_is_reported_and_confirm_shows_message() {
    let store = seven_students().await;
    store.set_fail_writes(true);
    let mut ctx = SchoolContext::new(store.clone());
    assert_eq!(StudentService::execute_delete(&mut ctx, 1).await, DeleteOutcome::Failed);
    assert_eq!(store.student_count(), 7);

    let confirm = StudentService::confirm_delete(&ctx, Some(1), Some(true)).await.unwrap();
    assert_eq!(confirm.error_message, Some(DELETE_FAILED_MESSAGE));
    let confirm = StudentService::confirm_delete(&ctx, Some(1), None).await.unwrap();
    assert_eq!(confirm.error_message, None);
    let err = StudentService::confirm_delete(&ctx, Some(99), Some(true)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn detail_requires_id_and_row() {
    let ctx = SchoolContext::new(seven_students().await);
    assert!(matches!(StudentService::detail(&ctx, None).await, Err(AppError::NotFound(_))));
    assert!(matches!(StudentService::detail(&ctx, Some(8)).await, Err(AppError::NotFound(_))));
    assert!(StudentService::detail(&ctx, Some(7)).await.is_ok());
}
