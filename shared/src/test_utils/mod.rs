pub mod dynamo_test_utils;
pub mod fixtures;
pub mod http_test_utils;
pub mod manual_clock;
pub mod mock_remote_store;
pub mod test_logging;
