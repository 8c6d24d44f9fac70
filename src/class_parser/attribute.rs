pub const CODE: &str = "Code";
