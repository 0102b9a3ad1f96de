mod test_authorization;
mod test_session_flow;
mod test_session_management;
