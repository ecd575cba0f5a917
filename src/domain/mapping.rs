// Mapping from upstream DTOs to domain models

use super::de::parse_datetime;
use super::models::{Character, Comic, ComicDate, Thumbnail};
use crate::marvel_client::{CharacterDto, ComicDto, DateDto, ImageDto};

pub fn map_thumbnail(image: ImageDto) -> Thumbnail {
    Thumbnail {
        path: image.path.unwrap_or_default(),
        extension: image.extension.unwrap_or_default(),
    }
}

pub fn map_date(date: DateDto) -> ComicDate {
    ComicDate {
        kind: date.kind,
        date: date.date.as_deref().and_then(parse_datetime),
    }
}

pub fn map_comic(dto: ComicDto) -> Comic {
    // upstream sends "" as often as null for a missing description
    let description = dto.description.filter(|d| !d.trim().is_empty());
    Comic {
        id: dto.id,
        title: dto.title.unwrap_or_default(),
        description,
        thumbnail: dto.thumbnail.map(map_thumbnail),
        dates: dto.dates.into_iter().map(map_date).collect(),
    }
}

pub fn map_character(dto: CharacterDto) -> Character {
    Character {
        id: dto.id,
        name: dto.name.unwrap_or_default(),
        thumbnail: dto.thumbnail.map(map_thumbnail),
    }
}
