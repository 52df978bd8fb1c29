use std::path::Path;

pub fn wallet_new_account(datadir: &str) -> eyre::Result<()> {
    let datadir = nem_utils::expand_path(datadir);
    let password = prompt_password("please enter a password to encrypt the new wallet:", true)?;

    let account = nem_keystore::new_account(&datadir, &password)?;

    println!("new account created: {account}");
    println!("saved in: {}", nem_keystore::keystore_dir_path(&datadir).display());
    Ok(())
}

pub fn wallet_pk_print(keystore_file: &str) -> eyre::Result<()> {
    let password = prompt_password("please enter a password to decrypt the wallet:", false)?;

    let (secret, public) = nem_keystore::decrypt_for_print(Path::new(keystore_file), &password)?;

    println!("private key: {}", hex::encode(secret.secret_bytes()));
    println!("public key: {}", hex::encode(public.serialize_uncompressed()));
    Ok(())
}

fn prompt_password(prompt: &str, confirm: bool) -> eyre::Result<String> {
    let password = rpassword::prompt_password(format!("{prompt} "))?;
    if confirm {
        let confirmation = rpassword::prompt_password("please re-enter the password to confirm: ")?;
        if confirmation != password {
            eyre::bail!("passwords did not match");
        }
    }
    Ok(password)
}
