mod test_auth_gate;
