#![no_main]
use std::io::Cursor;

use franz::{
    metadata::Metadata,
    protocol::{
        api_key::ApiKey,
        cursor::ByteCursor,
        frame::{AsyncMessageRead, AsyncMessageWrite},
        messages::{FetchResponse, ResponseHeader},
        primitives::Int16,
        traits::ReadType,
    },
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    driver(data).ok();
});

type Error = Box<dyn std::error::Error>;

fn driver(data: &[u8]) -> Result<(), Error> {
    let mut cursor = ByteCursor::new(data);
    let api_key = ApiKey::from(Int16::read(&mut cursor)?);
    let body = &data[cursor.offset()..];

    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio RT setup");

    // let the framing helpers add the length marker to help the fuzzer a bit
    let frame = rt.block_on(async move {
        let mut transport_data = Vec::with_capacity(body.len() + 4);
        transport_data.write_message(body).await?;
        Cursor::new(transport_data)
            .read_frame(body.len())
            .await
            .map_err(Error::from)
    })?;

    match api_key {
        ApiKey::Metadata => {
            let (metadata, _error) = Metadata::decode(&frame)?;
            for topic in &metadata.topics {
                for partition in &topic.partitions {
                    metadata.leader_url(&topic.name, partition.partition_index);
                }
            }
        }
        ApiKey::Fetch => {
            let mut cursor = ByteCursor::at(&frame, 4);
            ResponseHeader::read(&mut cursor)?;
            FetchResponse::decode(&frame[cursor.offset()..])?;
        }
        _ => return Err(format!("Fuzzing not implemented for: {api_key:?}").into()),
    }

    Ok(())
}
