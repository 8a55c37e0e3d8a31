pub mod authenticate_command;
pub mod change_user_command;
pub mod command;
pub mod query_command;
pub mod session_commands;
pub mod ssl_request_command;
pub mod stmt_close_command;
pub mod stmt_execute_command;
pub mod stmt_prepare_command;
pub mod stmt_reset_command;
pub mod stmt_send_long_data_command;
