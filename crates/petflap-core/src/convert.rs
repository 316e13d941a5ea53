// ── Wire-to-domain conversion ──
//
// Resolves the api crate's loosely-typed DTOs into domain types. String
// dispatch (species, direction) happens exactly once, here.

use std::collections::HashMap;

use petflap_api::{InfoDto, PassageDto, PetDto};

use crate::model::{DeviceIdentity, Direction, PassageEvent, Pet, PetId, PetStatusMap, Species};

pub(crate) fn identity_from_info(info: InfoDto) -> DeviceIdentity {
    DeviceIdentity {
        name: info.name,
        device_id: info.id,
        sw_version: info.sw_version,
        serial_number: info.serial,
    }
}

pub(crate) fn pet_from_dto(dto: PetDto) -> Pet {
    Pet {
        species: Species::from_wire(dto.species.as_deref()),
        id: PetId::from(dto.id),
        name: dto.name,
    }
}

/// Resolve a wire direction string. Unknown directions are a protocol
/// error -- a tracker reporting garbage must not silently read as "out".
fn direction_from_wire(raw: &str) -> Result<Direction, petflap_api::Error> {
    if raw.eq_ignore_ascii_case("in") {
        Ok(Direction::In)
    } else if raw.eq_ignore_ascii_case("out") {
        Ok(Direction::Out)
    } else {
        Err(petflap_api::Error::Deserialization {
            message: format!("unknown passage direction {raw:?}"),
            body: raw.to_owned(),
        })
    }
}

pub(crate) fn pet_status_from_dtos(
    raw: HashMap<String, PassageDto>,
) -> Result<PetStatusMap, petflap_api::Error> {
    raw.into_iter()
        .map(|(pet_id, dto)| {
            let event = PassageEvent {
                direction: direction_from_wire(&dto.direction)?,
                timestamp: dto.ts,
            };
            Ok((PetId::from(pet_id), event))
        })
        .collect()
}
