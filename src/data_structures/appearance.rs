//! Surface appearances and the room's appearance table.
//!
//! The room is lit entirely by baked textures, so every sub-mesh is drawn
//! unlit with either a baked texture or a flat colour. [`AppearanceTable::room`]
//! binds each [`Role`] to the appearance its sub-mesh receives.

/// Directory of the baked room textures, relative to the asset root.
pub const TEXTURE_DIR: &str = "room/textures/new";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Appearance {
    /// A baked texture, sampled with the model's UVs as-is (no vertical flip).
    Baked { url: String, color_space: ColorSpace },
    /// A single sRGB colour.
    Flat { color: [u8; 3] },
}

impl Appearance {
    pub fn baked(url: impl Into<String>) -> Self {
        Self::Baked {
            url: url.into(),
            color_space: ColorSpace::Srgb,
        }
    }

    /// Flat colour from a `0xRRGGBB` literal.
    pub fn flat(hex: u32) -> Self {
        Self::Flat {
            color: [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8],
        }
    }

    pub fn texture_url(&self) -> Option<&str> {
        match self {
            Appearance::Baked { url, .. } => Some(url),
            Appearance::Flat { .. } => None,
        }
    }
}

/// Semantic role of a room sub-mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Base,
    Items,
    Items2,
    Chair,
    Pc,
    AccentBlue,
    ScreenWhite,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Base,
        Role::Items,
        Role::Items2,
        Role::Chair,
        Role::Pc,
        Role::AccentBlue,
        Role::ScreenWhite,
    ];

    /// Name of the model node that plays this role.
    pub fn node_name(self) -> &'static str {
        match self {
            Role::Base => "BaseBaked",
            Role::Items => "itemsBaked",
            Role::Items2 => "items2Baked",
            Role::Chair => "chairBack",
            Role::Pc => "pcBaked",
            Role::AccentBlue => "eBaked",
            Role::ScreenWhite => "eScreen",
        }
    }
}

/// Read-only mapping from role to appearance.
#[derive(Clone, Debug, PartialEq)]
pub struct AppearanceTable {
    entries: Vec<(Role, Appearance)>,
}

impl AppearanceTable {
    pub fn new(entries: Vec<(Role, Appearance)>) -> Self {
        Self { entries }
    }

    pub fn room() -> Self {
        let baked = |file: &str| Appearance::baked(format!("{}/{}", TEXTURE_DIR, file));
        Self::new(vec![
            (Role::Base, baked("base.jpg")),
            (Role::Items, baked("itemsBaked1.jpg")),
            (Role::Items2, baked("itemsBaked2.jpg")),
            (Role::Chair, baked("bakedChair.jpg")),
            (Role::Pc, baked("pcBaked.jpg")),
            (Role::AccentBlue, Appearance::flat(0x0E54FF)),
            (Role::ScreenWhite, Appearance::flat(0xFFFFFF)),
        ])
    }

    pub fn get(&self, role: Role) -> Option<&Appearance> {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, appearance)| appearance)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &Appearance)> {
        self.entries.iter().map(|(role, appearance)| (*role, appearance))
    }

    /// Every texture the table references, once each, in table order.
    pub fn texture_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = Vec::new();
        for url in self.entries.iter().filter_map(|(_, a)| a.texture_url()) {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }
}

impl Default for AppearanceTable {
    fn default() -> Self {
        Self::room()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_table_covers_every_role() {
        let table = AppearanceTable::room();
        for role in Role::ALL {
            assert!(table.get(role).is_some(), "{:?} has no appearance", role);
        }
    }

    #[test]
    fn room_textures_are_srgb_and_unique() {
        let table = AppearanceTable::room();
        let urls = table.texture_urls();
        assert_eq!(
            urls,
            vec![
                "room/textures/new/base.jpg",
                "room/textures/new/itemsBaked1.jpg",
                "room/textures/new/itemsBaked2.jpg",
                "room/textures/new/bakedChair.jpg",
                "room/textures/new/pcBaked.jpg",
            ]
        );
        for (_, appearance) in table.iter() {
            if let Appearance::Baked { color_space, .. } = appearance {
                assert_eq!(*color_space, ColorSpace::Srgb);
            }
        }
    }

    #[test]
    fn flat_colours_decode_hex() {
        let table = AppearanceTable::room();
        assert_eq!(
            table.get(Role::AccentBlue),
            Some(&Appearance::Flat {
                color: [0x0E, 0x54, 0xFF]
            })
        );
        assert_eq!(
            table.get(Role::ScreenWhite),
            Some(&Appearance::Flat {
                color: [0xFF, 0xFF, 0xFF]
            })
        );
    }

    #[test]
    fn node_names_are_distinct() {
        let mut names: Vec<_> = Role::ALL.iter().map(|r| r.node_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Role::ALL.len());
    }
}
