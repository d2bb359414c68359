pub mod mock_github_server;
pub mod mock_services;
