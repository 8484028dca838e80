//! Built-in rule tables

pub(crate) const GENRE_ALIASES: &[(&str, &str)] = &[
    // Drum & Bass
    ("drum and bass", "Drum & Bass"),
    ("dnb", "Drum & Bass"),
    ("liquid funk", "Drum & Bass"),
    ("neurofunk", "Drum & Bass"),
    ("jump up", "Drum & Bass"),
    ("jungle", "Drum & Bass"),
    // Dubstep
    ("dubstep", "Dubstep"),
    ("brostep", "Dubstep"),
    ("riddim", "Dubstep"),
    ("melodic dubstep", "Melodic Dubstep"),
    // House
    ("house", "House"),
    ("deep house", "Deep House"),
    ("tech house", "Tech House"),
    ("progressive house", "Progressive House"),
    ("electro house", "Electro House"),
    ("future house", "Future House"),
    ("bass house", "Bass House"),
    // Everything else
    ("drumstep", "Drumstep"),
    ("breakbeat", "Breakbeat"),
    ("trap", "Trap"),
    ("future bass", "Future Bass"),
    ("hardstyle", "Hardstyle"),
    ("trance", "Trance"),
    ("psytrance", "Psytrance"),
    ("ambient", "Ambient"),
    ("synthwave", "Synthwave"),
];

pub(crate) const LABEL_RULES: &[(&str, &str)] = &[
    ("hospital records", "Drum & Bass"),
    ("ram records", "Drum & Bass"),
    ("monstercat", "EDM"),
    ("spinnin", "House"),
    ("revealed", "Electro House"),
    ("mau5trap", "Progressive House"),
    ("never say die", "Dubstep"),
];

pub(crate) const ARTIST_RULES: &[(&str, &str)] = &[
    ("noisia", "Drum & Bass"),
    ("pendulum", "Drum & Bass"),
    ("skrillex", "Dubstep"),
    ("deadmau5", "Progressive House"),
    ("martin garrix", "Electro House"),
    ("andy c", "Drum & Bass"),
    ("sub focus", "Drum & Bass"),
    ("dj zinc", "Drum & Bass"),
];
