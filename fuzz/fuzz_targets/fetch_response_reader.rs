#![no_main]
use franz::protocol::messages::FetchResponse;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(response) = FetchResponse::decode(data) {
        for topic in &response.responses {
            for partition in &topic.partitions {
                for message in &partition.messages {
                    message.compression();
                }
            }
        }
    }
});
