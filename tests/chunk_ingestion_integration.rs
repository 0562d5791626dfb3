// Voxel client core: Chunk Service ingestion tests.
//
// Exercises chunk ingestion and the sliding window (scenario S3) without
// a live REST server: chunks with no block-type groups to resolve load
// without touching the network, which also lets us verify the registry
// failure path (scenario S1/S2's "group fetch fails") drops a malformed
// batch instead of panicking.

use std::sync::Arc;

use voxel_client_core::block::registry::BlockTypeRegistry;
use voxel_client_core::config::ClientConfig;
use voxel_client_core::event::EventHub;
use voxel_client_core::network::protocol::{BlockDto, ChunkDataTransferObject};
use voxel_client_core::network::rest::RestClient;
use voxel_client_core::world::chunk::ChunkPos;
use voxel_client_core::world::chunk_service::ChunkService;

fn service() -> ChunkService {
    let registry = Arc::new(BlockTypeRegistry::new(Arc::new(RestClient::new_for_tests())));
    ChunkService::new(ClientConfig::default(), registry)
}

fn empty_chunk(cx: i32, cz: i32) -> ChunkDataTransferObject {
    ChunkDataTransferObject {
        cx,
        cz,
        blocks: None,
        height_data: None,
        items: None,
        backdrop: None,
        compressed: None,
    }
}

#[tokio::test]
async fn sliding_window_unloads_distant_chunks_and_registers_the_new_center() {
    println!("testing the chunk sliding window (scenario S3)");

    let mut svc = service();
    let events = EventHub::new();

    // Populate a 7x1 strip of chunks around the origin, (-3,0) .. (3,0),
    // none of which reference any block types, so ingestion never needs
    // the network.
    let dtos: Vec<ChunkDataTransferObject> = (-3..=3).map(|cx| empty_chunk(cx, 0)).collect();
    svc.on_chunk_update(dtos, &events).await.unwrap();
    for cx in -3..=3 {
        assert!(
            svc.is_loaded(ChunkPos::new(cx, 0)),
            "chunk ({cx}, 0) should have loaded with no block types to resolve"
        );
    }

    // Avatar steps to world (5*16, 0) — chunk (5, 0) — with
    // renderDistance=8, unloadDistance=10 from the default config. None
    // of the loaded strip is farther than 10 chebyshev cells away, so
    // nothing should unload yet; the register message should target the
    // new chunk.
    let register = svc.update_around(5.0 * 16.0, 0.0, &events);
    assert_eq!(register.cx, 5);
    assert_eq!(register.cz, 0);
    for cx in -3..=3 {
        assert!(
            svc.is_loaded(ChunkPos::new(cx, 0)),
            "chunk ({cx}, 0) should still be within unload distance of chunk (5, 0)"
        );
    }

    // A config with a tight unload distance should now drop the chunks
    // that fall outside it.
    let mut tight_config = ClientConfig::default();
    tight_config.unload_distance = 2;
    let mut tight_svc = ChunkService::new(
        tight_config,
        Arc::new(BlockTypeRegistry::new(Arc::new(RestClient::new_for_tests()))),
    );
    let dtos: Vec<ChunkDataTransferObject> = (-3..=3).map(|cx| empty_chunk(cx, 0)).collect();
    tight_svc.on_chunk_update(dtos, &events).await.unwrap();
    tight_svc.update_around(5.0 * 16.0, 0.0, &events);
    assert!(
        !tight_svc.is_loaded(ChunkPos::new(-3, 0)),
        "chunk (-3, 0) is 8 cells from the new center and should unload under unloadDistance=2"
    );
    assert!(
        tight_svc.is_loaded(ChunkPos::new(3, 0)),
        "chunk (3, 0) is within unloadDistance=2 of the new center and should stay loaded"
    );
}

#[tokio::test]
async fn chunk_referencing_unreachable_block_types_is_dropped_not_panicked() {
    println!("testing resilient ingestion when the block-type service is unreachable");

    let mut svc = service();
    let events = EventHub::new();

    let dto = ChunkDataTransferObject {
        cx: 0,
        cz: 0,
        blocks: Some(vec![BlockDto {
            x: 0,
            y: 63,
            z: 0,
            block_type: "core:stone".to_string(),
            status: 0,
            inline_modifier: None,
        }]),
        height_data: None,
        items: None,
        backdrop: None,
        compressed: None,
    };

    // The registry has no groups loaded and the REST client points at an
    // unreachable host, so preloading "core" fails. Ingestion should log
    // and skip this chunk rather than propagate the error or panic.
    svc.on_chunk_update(vec![dto], &events).await.unwrap();
    assert!(
        !svc.is_loaded(ChunkPos::new(0, 0)),
        "a chunk whose block types can't be resolved should be dropped, not partially ingested"
    );
}
