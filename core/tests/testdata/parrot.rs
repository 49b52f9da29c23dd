use std::process;

fn connect_to_database() -> Result<(), String> {
    Ok(())
}

fn main() {
    // connect to the database // want "parrot"
    let mut result = connect_to_database();

    // if error return // want "parrot"
    if result.is_err() {
        process::exit(1);
    }

    // This explains WHY we retry: network can be flaky in k8s
    result = connect_to_database();
    if result.is_err() {
        process::exit(1);
    }

    // fetch user from database // want "parrot"
    let user = fetch_user_from_database();
    println!("{user}");
}

fn fetch_user_from_database() -> String {
    "alice".to_string()
}

// process_order handles order processing // want "parrot"
fn process_order() {}

// validate_input ensures business rules are met before processing
// This is a policy decision: we reject orders under $10 to avoid payment fees
fn validate_input() {}
