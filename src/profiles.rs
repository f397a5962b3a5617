use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::info;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use xrgesture::Profile;

/// Shipped profiles, installed on first use.
const SHIPPED: [(&str, &str); 2] = [
    ("default", include_str!("../profiles/default.toml")),
    ("sensitive", include_str!("../profiles/sensitive.toml")),
];

/// On-disk profile directory plus the `active` pointer file.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    pub active_name: String,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

fn config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("could not determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("xrgesture"))
}

impl ProfileStore {
    pub fn load_or_install_default() -> Result<Self> {
        Self::open(&config_dir()?)
    }

    pub fn open(cfgdir: &Path) -> Result<Self> {
        let profdir = cfgdir.join("profiles");
        fs::create_dir_all(&profdir)?;

        for (name, text) in SHIPPED {
            let path = profdir.join(format!("{name}.toml"));
            if !path.exists() {
                fs::write(&path, text)?;
                info!("installed {name} profile at {}", path.display());
            }
        }

        let active_ptr = cfgdir.join("active");
        if !active_ptr.exists() {
            let mut f = fs::File::create(&active_ptr)?;
            f.write_all(b"default")?;
        }
        let active_name = fs::read_to_string(&active_ptr)?.trim().to_string();

        Ok(Self {
            active_name,
            profiles_dir: profdir,
            active_ptr,
        })
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{name}.toml"))
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let p = self.path_of(name);
        if !p.exists() {
            return Err(anyhow!("profile not found: {}", p.display()));
        }
        // refuse to point at a profile that would not load
        Profile::load(&p)?;
        fs::write(&self.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        Ok(())
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let path = e.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }

    pub fn load(&self, name: &str) -> Result<Profile> {
        Ok(Profile::load(&self.path_of(name))?)
    }

    pub fn load_active(&self) -> Result<Profile> {
        self.load(&self.active_name)
    }
}
